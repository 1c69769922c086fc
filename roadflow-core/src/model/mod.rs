//! Data model for traffic fusion
//!
//! Contains the road network, measured segments and the per-cycle snapshot.

pub mod network;
pub mod segment;
pub mod snapshot;

pub use network::{
    EdgeAttributes, EdgeKey, Junction, OsmNodeId, RoadEdge, RoadGraph, RoadNetwork,
    RoadNetworkBuilder, RoadNode,
};
pub use segment::{MeasuredSegment, SegmentId};
pub use snapshot::{CycleSnapshot, EdgeSnapshot};
