use log::trace;
use petgraph::graph::EdgeIndex;

use super::bearing::are_opposite_bearings;
use crate::RoadNetwork;

/// Which way a measured segment runs relative to its matched edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    AsMatched,
    Reversed,
}

/// Decide whether a segment travelling at `api_bearing` runs along the
/// matched edge or against it.
///
/// One-way edges are never flipped: a bearing disagreement there is matching
/// noise, the network's direction is authoritative.
pub fn resolve_direction(
    edge_bearing: f64,
    api_bearing: f64,
    oneway: bool,
    tolerance: f64,
) -> Direction {
    if !oneway && are_opposite_bearings(edge_bearing, api_bearing, tolerance) {
        Direction::Reversed
    } else {
        Direction::AsMatched
    }
}

/// Resolve the matched edge to the directed edge that carries the segment's
/// flow: either `matched` itself or its `(v, u, k)` twin.
pub fn resolve_edge(
    network: &RoadNetwork,
    matched: EdgeIndex,
    api_bearing: f64,
    tolerance: f64,
) -> EdgeIndex {
    let edge = network.edge(matched);
    let resolved = match resolve_direction(edge.bearing, api_bearing, edge.oneway, tolerance) {
        Direction::AsMatched => matched,
        Direction::Reversed => network.reverse_twin(matched).unwrap_or_else(|| {
            log::warn!(
                "Edge {} runs against the measured flow but has no reverse twin, keeping it",
                network.edge_key(matched)
            );
            matched
        }),
    };
    trace!(
        "Resolved {} to {} for bearing {api_bearing:.1}",
        network.edge_key(matched),
        network.edge_key(resolved)
    );
    resolved
}

/// Whether the segment runs against the canonical direction of the way the
/// edge belongs to, combining the bearing comparison with the edge's
/// `reversed` flag.
pub fn against_canonical(edge_bearing: f64, api_bearing: f64, reversed: bool, tolerance: f64) -> bool {
    if are_opposite_bearings(edge_bearing, api_bearing, tolerance) {
        !reversed
    } else {
        reversed
    }
}
