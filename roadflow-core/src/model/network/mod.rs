//! Directed road multigraph

mod builder;
pub mod components;
mod graph;

pub use builder::{EdgeAttributes, RoadNetworkBuilder};
pub use components::{EdgeKey, Junction, OsmNodeId, RoadEdge, RoadNode};
pub use graph::{RoadGraph, RoadNetwork};
