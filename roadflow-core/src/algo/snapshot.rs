use petgraph::graph::EdgeIndex;

use crate::{
    TrafficLevel,
    model::{CycleSnapshot, SegmentId},
};

/// Final edge assignment of one measured segment after direction resolution
/// and corrections
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMatch {
    pub segment: SegmentId,
    pub edge: EdgeIndex,
    /// Edges receiving the same value through a correction rule
    pub collateral: Vec<EdgeIndex>,
    pub traffic_level: TrafficLevel,
}

/// Stamp every resolved match, and its collateral edges, as measured.
///
/// Matches are applied in order, so a later match on the same edge replaces
/// an earlier one. Returns the number of stamps written.
pub fn stamp_matches(snapshot: &mut CycleSnapshot, matches: &[ResolvedMatch]) -> usize {
    let mut stamps = 0;
    for matched in matches {
        for edge in std::iter::once(&matched.edge).chain(&matched.collateral) {
            snapshot.stamp(*edge, matched.traffic_level);
            stamps += 1;
        }
    }
    log::debug!(
        "Stamped {stamps} observations onto {} distinct edges",
        snapshot.measured_count()
    );
    stamps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeAttributes, RoadNetworkBuilder};

    #[test]
    fn stamps_collateral_and_keeps_last_write() {
        let mut b = RoadNetworkBuilder::new();
        b.add_node(1, 0.0, 0.0).unwrap();
        b.add_node(2, 0.0, 0.001).unwrap();
        b.add_node(3, 0.0, 0.002).unwrap();
        let (a, a_rev) = b.add_two_way(1, 2, EdgeAttributes::default()).unwrap();
        let c = b.add_edge(2, 3, 0, EdgeAttributes::default()).unwrap();
        let net = b.build();

        let mut snapshot = CycleSnapshot::new("c", &net);
        let written = stamp_matches(&mut snapshot, &[
            ResolvedMatch {
                segment: 0,
                edge: a,
                collateral: vec![c],
                traffic_level: 0.2,
            },
            ResolvedMatch {
                segment: 1,
                edge: a,
                collateral: vec![],
                traffic_level: 0.9,
            },
        ]);

        assert_eq!(written, 3);
        assert_eq!(snapshot.traffic_level(a), Some(0.9));
        assert_eq!(snapshot.traffic_level(c), Some(0.2));
        assert!(snapshot.get(c).is_measured);
        assert_eq!(snapshot.traffic_level(a_rev), None);
        assert!(!snapshot.get(a_rev).is_measured);
    }
}
