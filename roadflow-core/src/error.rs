use thiserror::Error;

use crate::model::{EdgeKey, OsmNodeId};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Degenerate input range [{min}, {max}] for normalization")]
    DegenerateRange { min: f64, max: f64 },
    #[error("Nearest edge query returned {got} results for {expected} segments")]
    MatchCountMismatch { expected: usize, got: usize },
    #[error("Unknown node {0}")]
    UnknownNode(OsmNodeId),
    #[error("Unknown edge {0}")]
    UnknownEdge(EdgeKey),
    #[error("Invalid cycle id '{0}', expected %Y_%m_%d_%H_%M_%S")]
    InvalidCycleId(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}
