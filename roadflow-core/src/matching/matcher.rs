use log::{debug, trace};
use petgraph::graph::EdgeIndex;

use super::nearest::NearestEdgeQuery;
use crate::{EngineConfig, Error, MeasuredSegment, RoadNetwork};

/// Reason recorded for segments dropped by the distance tolerance
pub const TOO_DISTANT: &str = "Very distant from the nearest edge";

/// Result of snapping one segment midpoint onto the network
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome {
    Matched { edge: EdgeIndex, distance_m: f64 },
    /// Nearest edge is beyond the tolerance; the segment is lost for the cycle
    TooDistant { edge: EdgeIndex, distance_m: f64 },
}

impl MatchOutcome {
    pub fn edge(&self) -> EdgeIndex {
        match self {
            MatchOutcome::Matched { edge, .. } | MatchOutcome::TooDistant { edge, .. } => *edge,
        }
    }

    pub fn distance_m(&self) -> f64 {
        match self {
            MatchOutcome::Matched { distance_m, .. }
            | MatchOutcome::TooDistant { distance_m, .. } => *distance_m,
        }
    }

    /// Edge of a reliable match
    pub fn matched_edge(&self) -> Option<EdgeIndex> {
        match self {
            MatchOutcome::Matched { edge, .. } => Some(*edge),
            MatchOutcome::TooDistant { .. } => None,
        }
    }
}

/// Snap every segment midpoint to its nearest edge and classify the match
/// against the distance tolerance.
///
/// The returned outcomes are aligned with `segments`.
///
/// # Errors
///
/// Returns [`Error::MatchCountMismatch`] when the query answers a different
/// number of points than it was asked, and [`Error::InvalidData`] when it
/// names an edge `network` does not have. Either way the whole batch is
/// rejected.
pub fn match_segments<Q: NearestEdgeQuery + ?Sized>(
    query: &Q,
    network: &RoadNetwork,
    segments: &[MeasuredSegment],
    config: &EngineConfig,
) -> Result<Vec<MatchOutcome>, Error> {
    let midpoints: Vec<_> = segments.iter().map(MeasuredSegment::midpoint).collect();
    let nearest = query.nearest_edges(&midpoints);

    if nearest.len() != segments.len() {
        return Err(Error::MatchCountMismatch {
            expected: segments.len(),
            got: nearest.len(),
        });
    }
    if let Some((edge, _)) = nearest.iter().find(|(edge, _)| edge.index() >= network.edge_count()) {
        return Err(Error::InvalidData(format!(
            "Nearest edge query returned edge {} of a network with {} edges",
            edge.index(),
            network.edge_count()
        )));
    }

    let outcomes: Vec<MatchOutcome> = segments
        .iter()
        .zip(nearest)
        .map(|(segment, (edge, distance))| {
            let distance_m = distance * config.degrees_to_meters;
            if distance_m > config.match_distance_tolerance_m {
                trace!(
                    "Segment {} is {distance_m:.1} m from edge {}, dropped",
                    segment.id,
                    edge.index()
                );
                MatchOutcome::TooDistant { edge, distance_m }
            } else {
                MatchOutcome::Matched { edge, distance_m }
            }
        })
        .collect();

    debug!(
        "Matched {} of {} segments within {} m",
        outcomes.iter().filter(|o| o.matched_edge().is_some()).count(),
        segments.len(),
        config.match_distance_tolerance_m
    );

    Ok(outcomes)
}
