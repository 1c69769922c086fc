//! One ingestion cycle, from extracted segments to a diffused snapshot

mod diagnostics;
mod document;

use log::{info, trace};

pub use diagnostics::{SegmentDiagnostics, diagnostics_to_geojson};
pub use document::{CYCLE_ID_FORMAT, CycleMeta, SnapshotDocument, SnapshotLink, SnapshotSink};

use crate::{
    EngineConfig, Error, MeasuredSegment, RoadNetwork,
    algo::{
        DiffusionReport, NeighborIndex, ResolvedMatch, SplitPlan, default_round_cap, diffuse,
        split_segments, stamp_matches,
    },
    matching::{
        CardinalDirection, CorrectionTable, MatchOutcome, NearestEdgeQuery, TOO_DISTANT,
        against_canonical, match_segments, resolve_edge,
    },
    model::{CycleSnapshot, SegmentId},
    tiles::{DecodedTile, TileBounds, merge_tiles},
};

/// Everything a cycle produced
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub snapshot: CycleSnapshot,
    /// First-pass annotations, one per input segment
    pub diagnostics: Vec<SegmentDiagnostics>,
    /// Final edge assignments of the pieces that survived both passes
    pub matches: Vec<ResolvedMatch>,
    pub diffusion: DiffusionReport,
}

impl CycleOutcome {
    /// # Errors
    ///
    /// See [`SnapshotDocument::build`].
    pub fn to_document(&self, network: &RoadNetwork) -> Result<SnapshotDocument, Error> {
        SnapshotDocument::build(network, &self.snapshot)
    }
}

/// Matching and imputation engine over one road network.
///
/// Holds only shared references to the long-lived inputs, so any number of
/// cycles can run against the same network one after another without state
/// carried between them.
pub struct FusionEngine<'a, Q: NearestEdgeQuery + ?Sized> {
    network: &'a RoadNetwork,
    neighbors: &'a NeighborIndex,
    query: &'a Q,
    corrections: &'a CorrectionTable,
    config: EngineConfig,
}

impl<'a, Q: NearestEdgeQuery + ?Sized> FusionEngine<'a, Q> {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an invalid configuration or a
    /// neighbor index built for another network.
    pub fn new(
        network: &'a RoadNetwork,
        neighbors: &'a NeighborIndex,
        query: &'a Q,
        corrections: &'a CorrectionTable,
        config: EngineConfig,
    ) -> Result<Self, Error> {
        config.validate()?;
        if neighbors.len() != network.edge_count() {
            return Err(Error::InvalidConfig(format!(
                "Neighbor index covers {} edges, network has {}",
                neighbors.len(),
                network.edge_count()
            )));
        }
        Ok(Self {
            network,
            neighbors,
            query,
            corrections,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Extract the segments of all tiles of a cycle and run it
    ///
    /// # Errors
    ///
    /// See [`merge_tiles`] and [`run_cycle`](Self::run_cycle).
    pub fn run_tiles<'t>(
        &self,
        cycle_id: &str,
        tiles: impl IntoIterator<Item = (&'t DecodedTile, TileBounds)>,
    ) -> Result<CycleOutcome, Error> {
        let segments = merge_tiles(tiles, &self.config.traffic_property)?;
        self.run_cycle(cycle_id, &segments)
    }

    /// Run one cycle over already extracted segments.
    ///
    /// 1. match every segment, drop distant ones and plan splits;
    /// 2. split long segments and match the pieces again;
    /// 3. resolve direction and corrections, stamp the snapshot;
    /// 4. diffuse into unmeasured edges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MatchCountMismatch`] when the spatial query does not
    /// answer every segment and [`Error::InvalidData`] when it answers with
    /// edges of another network. Distant segments are not errors.
    pub fn run_cycle(&self, cycle_id: &str, segments: &[MeasuredSegment]) -> Result<CycleOutcome, Error> {
        info!("Cycle {cycle_id}: {} segments", segments.len());

        let (kept, plans, diagnostics) = self.plan_splits(segments)?;

        let mut next_id: SegmentId = segments.iter().map(|s| s.id + 1).max().unwrap_or(0);
        let pieces = split_segments(&kept, &plans, &mut next_id)?;

        let matches = self.resolve_pieces(&pieces)?;

        let mut snapshot = CycleSnapshot::new(cycle_id, self.network);
        stamp_matches(&mut snapshot, &matches);

        let max_rounds = self
            .config
            .diffusion_max_rounds
            .unwrap_or_else(|| default_round_cap(self.network.edge_count()));
        let diffusion = diffuse(
            &mut snapshot,
            self.neighbors,
            self.config.diffusion_precision_digits,
            max_rounds,
        );

        info!(
            "Cycle {cycle_id}: {} of {} segments kept, {} pieces matched, {} edges measured, \
             {} interpolated, {} of {} informed",
            kept.len(),
            segments.len(),
            matches.len(),
            snapshot.measured_count(),
            diffusion.interpolated,
            snapshot.informed_count(),
            snapshot.len()
        );

        Ok(CycleOutcome {
            snapshot,
            diagnostics,
            matches,
            diffusion,
        })
    }

    /// First pass: tolerance filter, split plan and diagnostics per segment
    fn plan_splits(
        &self,
        segments: &[MeasuredSegment],
    ) -> Result<(Vec<MeasuredSegment>, Vec<SplitPlan>, Vec<SegmentDiagnostics>), Error> {
        let outcomes = match_segments(self.query, self.network, segments, &self.config)?;
        let tolerance = self.config.direction_opposition_tolerance_deg;

        let mut kept = Vec::new();
        let mut plans = Vec::new();
        let mut diagnostics = Vec::with_capacity(segments.len());

        for (segment, outcome) in segments.iter().zip(&outcomes) {
            let edge = self.network.edge(outcome.edge());
            let api_bearing = segment.bearing();

            let (error, splits) = match outcome {
                MatchOutcome::Matched { .. } => {
                    let plan = SplitPlan::plan(
                        segment.length_m(self.config.degrees_to_meters),
                        self.config.split_target_m,
                        edge,
                    );
                    kept.push(segment.clone());
                    plans.push(plan);
                    (None, Some(plan.marker()))
                }
                MatchOutcome::TooDistant { .. } => (Some(TOO_DISTANT), None),
            };

            diagnostics.push(SegmentDiagnostics {
                segment: segment.clone(),
                nearest_edge: self.network.edge_key(outcome.edge()),
                distance_m: outcome.distance_m(),
                error,
                api_bearing,
                aiming: CardinalDirection::from_bearing(api_bearing),
                nearest_edge_reverse: against_canonical(edge.bearing, api_bearing, edge.reversed, tolerance),
                splits,
                junction: edge.junction.clone(),
            });
        }

        Ok((kept, plans, diagnostics))
    }

    /// Second pass: match pieces, resolve direction, apply corrections
    fn resolve_pieces(&self, pieces: &[MeasuredSegment]) -> Result<Vec<ResolvedMatch>, Error> {
        let outcomes = match_segments(self.query, self.network, pieces, &self.config)?;
        let tolerance = self.config.direction_opposition_tolerance_deg;

        let matches = pieces
            .iter()
            .zip(&outcomes)
            .filter_map(|(piece, outcome)| outcome.matched_edge().map(|edge| (piece, edge)))
            .map(|(piece, matched)| {
                let api_bearing = piece.bearing();
                let edge = resolve_edge(self.network, matched, api_bearing, tolerance);

                match self.corrections.lookup(self.network, edge, api_bearing, tolerance) {
                    Some(correction) => {
                        trace!(
                            "Segment {}: correcting {} to {}",
                            piece.id,
                            self.network.edge_key(edge),
                            self.network.edge_key(correction.replacement)
                        );
                        ResolvedMatch {
                            segment: piece.id,
                            edge: correction.replacement,
                            collateral: correction.collateral.clone(),
                            traffic_level: piece.traffic_level,
                        }
                    }
                    None => ResolvedMatch {
                        segment: piece.id,
                        edge,
                        collateral: Vec::new(),
                        traffic_level: piece.traffic_level,
                    },
                }
            })
            .collect();

        Ok(matches)
    }
}
