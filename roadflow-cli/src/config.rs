use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use roadflow_core::{EngineConfig, matching::CorrectionRule, tiles::TileBounds};
use serde::Deserialize;

use crate::error::CliError;

fn default_poll_interval() -> u64 {
    60
}

/// Top-level `roadflow.toml`
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    /// Documents go to `<output_dir>/<zone>/<cycle>.json`
    pub output_dir: PathBuf,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Also write segment diagnostics as `GeoJSON`
    #[serde(default)]
    pub diagnostics: bool,
    pub zones: Vec<ZoneConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    /// Node-link JSON road network
    pub network: PathBuf,
    /// Decoded tiles are read from `<input_dir>/<tile>/<cycle>.json`
    pub input_dir: PathBuf,
    pub tiles: Vec<TileConfig>,
    #[serde(default)]
    pub corrections: Vec<CorrectionRule>,
    /// Extra rules from a JSON file, appended to the inline ones
    #[serde(default)]
    pub corrections_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TileConfig {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileConfig {
    pub fn bounds(&self) -> TileBounds {
        TileBounds::from_xyz(self.x, self.y, self.zoom)
    }
}

impl CliConfig {
    /// Read and validate a config file; relative paths inside it are taken
    /// relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&content, base).map_err(|e| match e {
            CliError::Toml { source, .. } => CliError::Toml {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str, base: &Path) -> Result<Self, CliError> {
        let mut config: CliConfig = toml::from_str(content).map_err(|source| CliError::Toml {
            path: PathBuf::new(),
            source,
        })?;
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.output_dir);
        for zone in &mut self.zones {
            resolve(&mut zone.network);
            resolve(&mut zone.input_dir);
            if let Some(file) = zone.corrections_file.as_mut() {
                resolve(file);
            }
        }
    }

    fn validate(&self) -> Result<(), CliError> {
        self.engine.validate()?;
        if self.poll_interval_secs == 0 {
            return Err(CliError::InvalidConfig(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.zones.is_empty() {
            return Err(CliError::InvalidConfig("No zones configured".to_string()));
        }

        let mut names = HashSet::new();
        for zone in &self.zones {
            if !names.insert(zone.name.as_str()) {
                return Err(CliError::InvalidConfig(format!(
                    "Duplicate zone '{}'",
                    zone.name
                )));
            }
            if zone.tiles.is_empty() {
                return Err(CliError::InvalidConfig(format!(
                    "Zone '{}' has no tiles",
                    zone.name
                )));
            }
        }
        Ok(())
    }
}
