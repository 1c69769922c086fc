//! This module is responsible for loading the inputs of the engine: its
//! configuration, the road network and the correction table.

mod config;
mod corrections;
mod network;

pub use config::EngineConfig;
pub use corrections::{corrections_from_json_str, load_corrections};
pub use network::{load_network, network_from_json_str};
