use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] roadflow_core::Error),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Zone '{zone}' is missing tile '{tile}' for cycle {cycle}")]
    MissingTile {
        zone: String,
        tile: String,
        cycle: String,
    },
    #[error("{failed} of {total} zones failed")]
    ZonesFailed { failed: usize, total: usize },
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
