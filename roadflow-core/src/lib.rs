//! Traffic-flow fusion engine.
//!
//! Snaps sparse tile-based traffic measurements onto a directed road
//! network and fills the unmeasured edges by neighbor diffusion, producing
//! one complete per-edge snapshot per ingestion cycle.

pub mod algo;
pub mod cycle;
mod error;
pub mod loading;
pub mod matching;
pub mod model;
pub mod prelude;
pub mod tiles;

pub use error::Error;

/// Ratio of current speed to free-flow speed
pub type TrafficLevel = f64;

/// Scale from network coordinate degrees to meters.
///
/// Treats one degree as ~100 km regardless of latitude, which only holds
/// near the latitudes the reference deployment runs at.
pub const DEGREES_TO_METERS: f64 = 100_000.0;

/// Side length of the tile-local coordinate space
pub const TILE_EXTENT: u32 = 4096;

pub use cycle::{CycleOutcome, FusionEngine};
pub use loading::EngineConfig;
pub use model::{CycleSnapshot, EdgeKey, EdgeSnapshot, MeasuredSegment, RoadNetwork};
