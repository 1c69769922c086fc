//! Per-cycle traffic snapshot
//!
//! A [`CycleSnapshot`] is created fresh for every cycle and is never stored
//! inside the [`RoadNetwork`], so values cannot leak from one cycle into the
//! next.

use petgraph::graph::EdgeIndex;
use serde::Serialize;

use crate::{RoadNetwork, TrafficLevel};

/// Traffic observation of a single edge for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EdgeSnapshot {
    /// `None` until the edge is measured or reached by diffusion
    pub traffic_level: Option<TrafficLevel>,
    /// Set only for direct measurements; diffusion never touches these edges
    pub is_measured: bool,
}

/// One [`EdgeSnapshot`] per network edge, indexed by `EdgeIndex`
#[derive(Debug, Clone)]
pub struct CycleSnapshot {
    cycle_id: String,
    entries: Vec<EdgeSnapshot>,
}

impl CycleSnapshot {
    /// Every edge starts out absent and unmeasured
    pub fn new(cycle_id: impl Into<String>, network: &RoadNetwork) -> Self {
        Self {
            cycle_id: cycle_id.into(),
            entries: vec![EdgeSnapshot::default(); network.edge_count()],
        }
    }

    pub fn cycle_id(&self) -> &str {
        &self.cycle_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, edge: EdgeIndex) -> &EdgeSnapshot {
        &self.entries[edge.index()]
    }

    pub fn traffic_level(&self, edge: EdgeIndex) -> Option<TrafficLevel> {
        self.entries[edge.index()].traffic_level
    }

    /// Record a direct measurement. Later calls for the same edge overwrite
    /// earlier ones.
    pub fn stamp(&mut self, edge: EdgeIndex, traffic_level: TrafficLevel) {
        self.entries[edge.index()] = EdgeSnapshot {
            traffic_level: Some(traffic_level),
            is_measured: true,
        };
    }

    pub(crate) fn set_interpolated(&mut self, index: usize, traffic_level: TrafficLevel) {
        debug_assert!(!self.entries[index].is_measured);
        self.entries[index].traffic_level = Some(traffic_level);
    }

    pub(crate) fn entries(&self) -> &[EdgeSnapshot] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (EdgeIndex, &EdgeSnapshot)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, snapshot)| (EdgeIndex::new(idx), snapshot))
    }

    pub fn measured_count(&self) -> usize {
        self.entries.iter().filter(|s| s.is_measured).count()
    }

    /// Edges holding a value, measured or diffused
    pub fn informed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|s| s.traffic_level.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeAttributes, RoadNetworkBuilder};

    #[test]
    fn new_snapshot_is_absent_everywhere() {
        let mut b = RoadNetworkBuilder::new();
        b.add_node(1, 0.0, 0.0).unwrap();
        b.add_node(2, 0.0, 0.001).unwrap();
        b.add_two_way(1, 2, EdgeAttributes::default()).unwrap();
        let net = b.build();

        let snapshot = CycleSnapshot::new("2024_05_06_08_15_00", &net);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.informed_count(), 0);
        assert!(snapshot.iter().all(|(_, s)| *s == EdgeSnapshot::default()));
    }

    #[test]
    fn stamping_is_last_write_wins() {
        let mut b = RoadNetworkBuilder::new();
        b.add_node(1, 0.0, 0.0).unwrap();
        b.add_node(2, 0.0, 0.001).unwrap();
        let e = b.add_edge(1, 2, 0, EdgeAttributes::default()).unwrap();
        let net = b.build();

        let mut snapshot = CycleSnapshot::new("c", &net);
        snapshot.stamp(e, 0.3);
        snapshot.stamp(e, 0.8);
        assert_eq!(snapshot.traffic_level(e), Some(0.8));
        assert!(snapshot.get(e).is_measured);
        assert_eq!(snapshot.measured_count(), 1);
    }
}
