pub use crate::DEGREES_TO_METERS;

// Re-export key components
pub use crate::algo::{DiffusionReport, NeighborIndex, diffuse};
pub use crate::cycle::{
    CycleOutcome, FusionEngine, SegmentDiagnostics, SnapshotDocument, SnapshotSink,
    diagnostics_to_geojson,
};
pub use crate::loading::{EngineConfig, load_corrections, load_network};
pub use crate::matching::{CorrectionRule, CorrectionTable, EdgeRTree, NearestEdgeQuery};
pub use crate::model::{
    CycleSnapshot, EdgeAttributes, EdgeSnapshot, MeasuredSegment, RoadNetwork, RoadNetworkBuilder,
};
pub use crate::tiles::{DecodedTile, TileBounds, TileTransform, merge_tiles};

// Core identifiers
pub use crate::model::{EdgeKey, OsmNodeId, SegmentId};
pub use crate::TrafficLevel; // ratio of current to free-flow speed
