//! Per-zone state and cycle execution

use std::{
    fs,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use roadflow_core::{
    EngineConfig, FusionEngine, RoadNetwork,
    algo::NeighborIndex,
    cycle::{CycleMeta, CycleOutcome, SnapshotSink, diagnostics_to_geojson},
    loading::{load_corrections, load_network},
    matching::{CorrectionTable, EdgeRTree},
    tiles::{DecodedTile, TileBounds},
};
use tracing::{debug, info, warn};

use crate::{
    config::{CliConfig, TileConfig, ZoneConfig},
    error::CliError,
    sink::JsonFileSink,
};

/// A road network with everything derived from it, built once at startup
pub struct Zone {
    pub name: String,
    network: RoadNetwork,
    neighbors: NeighborIndex,
    tree: EdgeRTree,
    corrections: CorrectionTable,
    input_dir: PathBuf,
    tiles: Vec<TileConfig>,
}

impl Zone {
    pub fn load(config: &ZoneConfig) -> Result<Self, CliError> {
        let network = load_network(&config.network)?;

        let mut rules = config.corrections.clone();
        if let Some(file) = &config.corrections_file {
            rules.extend(load_corrections(file)?);
        }
        let corrections = CorrectionTable::resolve(&rules, &network)?;

        let neighbors = NeighborIndex::build(&network);
        let tree = EdgeRTree::build(&network);
        info!(
            "Zone '{}': {} nodes, {} edges, {} correction rules",
            config.name,
            network.node_count(),
            network.edge_count(),
            corrections.len()
        );

        Ok(Self {
            name: config.name.clone(),
            network,
            neighbors,
            tree,
            corrections,
            input_dir: config.input_dir.clone(),
            tiles: config.tiles.clone(),
        })
    }

    fn tile_path(&self, tile: &TileConfig, cycle_id: &str) -> PathBuf {
        self.input_dir.join(&tile.name).join(format!("{cycle_id}.json"))
    }

    fn sink(&self, output_dir: &Path) -> JsonFileSink {
        JsonFileSink::new(output_dir.join(&self.name))
    }

    /// Cycles whose tiles are all present and that have neither a document
    /// nor a failure marker yet, oldest first
    pub fn pending_cycles(&self, output_dir: &Path) -> Vec<String> {
        let Some(first) = self.tiles.first() else {
            return Vec::new();
        };
        let Ok(entries) = fs::read_dir(self.input_dir.join(&first.name)) else {
            return Vec::new();
        };
        let sink = self.sink(output_dir);

        let mut cycles: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
                } else {
                    None
                }
            })
            .filter(|id| CycleMeta::from_cycle_id(id).is_ok())
            .filter(|id| self.tiles.iter().all(|tile| self.tile_path(tile, id).exists()))
            .filter(|id| !sink.path_for(id).exists() && !sink.failed_path_for(id).exists())
            .collect();
        cycles.sort();
        cycles
    }

    fn read_tiles(&self, cycle_id: &str) -> Result<Vec<(DecodedTile, TileBounds)>, CliError> {
        self.tiles
            .par_iter()
            .map(|tile| {
                let path = self.tile_path(tile, cycle_id);
                if !path.exists() {
                    return Err(CliError::MissingTile {
                        zone: self.name.clone(),
                        tile: tile.name.clone(),
                        cycle: cycle_id.to_string(),
                    });
                }
                let content = fs::read_to_string(&path).map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                })?;
                let decoded = DecodedTile::from_json_str(&content)?;
                debug!("Read {} features from {}", decoded.feature_count(), path.display());
                Ok((decoded, tile.bounds()))
            })
            .collect()
    }

    /// Run one cycle and store its document, plus diagnostics when enabled
    pub fn run_cycle(&self, cycle_id: &str, config: &CliConfig) -> Result<CycleOutcome, CliError> {
        let tiles = self.read_tiles(cycle_id)?;
        let outcome = self
            .engine(config.engine.clone())?
            .run_tiles(cycle_id, tiles.iter().map(|(tile, bounds)| (tile, *bounds)))?;

        let document = outcome.to_document(&self.network)?;
        let mut sink = self.sink(&config.output_dir);
        sink.store(&document)?;

        if config.diagnostics {
            let path = sink.dir().join("diagnostics").join(format!("{cycle_id}.geojson"));
            let write = || -> Result<(), CliError> {
                let collection = diagnostics_to_geojson(&outcome.diagnostics)?;
                let json = serde_json::to_string(&collection).map_err(roadflow_core::Error::from)?;
                fs::create_dir_all(sink.dir().join("diagnostics")).map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                })?;
                fs::write(&path, json).map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                })
            };
            if let Err(e) = write() {
                warn!("Zone '{}': diagnostics not written: {e}", self.name);
            }
        }

        Ok(outcome)
    }

    /// Leave a marker so that polling stops retrying `cycle_id`. Delete the
    /// marker to have the cycle picked up again.
    fn mark_failed(&self, cycle_id: &str, output_dir: &Path, error: &CliError) {
        let sink = self.sink(output_dir);
        let path = sink.failed_path_for(cycle_id);
        let written = fs::create_dir_all(sink.dir()).and_then(|()| fs::write(&path, format!("{error}\n")));
        if let Err(e) = written {
            warn!("Zone '{}': failure marker {} not written: {e}", self.name, path.display());
        }
    }

    fn engine(&self, config: EngineConfig) -> Result<FusionEngine<'_, EdgeRTree>, CliError> {
        Ok(FusionEngine::new(
            &self.network,
            &self.neighbors,
            &self.tree,
            &self.corrections,
            config,
        )?)
    }
}

pub fn load_zones(config: &CliConfig) -> Result<Vec<Zone>, CliError> {
    config.zones.iter().map(Zone::load).collect()
}

/// Run `cycle_id` in every zone. Zones are independent: a failing zone is
/// reported and the others still run. Returns the number of zones that
/// stored a document.
pub fn process_cycle(zones: &[Zone], config: &CliConfig, cycle_id: &str) -> usize {
    zones
        .iter()
        .filter(|zone| report(zone, cycle_id, zone.run_cycle(cycle_id, config)).is_ok())
        .count()
}

/// Process every pending cycle of every zone. A cycle that fails is marked
/// and not retried on later polls.
pub fn process_pending(zones: &[Zone], config: &CliConfig) -> usize {
    let mut stored = 0;
    for zone in zones {
        for cycle_id in zone.pending_cycles(&config.output_dir) {
            match report(zone, &cycle_id, zone.run_cycle(&cycle_id, config)) {
                Ok(()) => stored += 1,
                Err(e) => zone.mark_failed(&cycle_id, &config.output_dir, &e),
            }
        }
    }
    stored
}

fn report(zone: &Zone, cycle_id: &str, result: Result<CycleOutcome, CliError>) -> Result<(), CliError> {
    match result {
        Ok(outcome) => {
            info!(
                "Zone '{}' cycle {cycle_id}: {} measured, {} informed of {} edges",
                zone.name,
                outcome.snapshot.measured_count(),
                outcome.snapshot.informed_count(),
                outcome.snapshot.len()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Zone '{}' cycle {cycle_id} failed: {e}", zone.name);
            Err(e)
        }
    }
}
