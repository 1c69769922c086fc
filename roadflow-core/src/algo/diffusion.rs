//! Neighbor-averaging imputation of unmeasured edges
//!
//! Each round visits every unmeasured edge in index order and replaces its
//! value with the mean of its informed neighbors when the mean differs from
//! the current value at the configured precision. New values are visible to
//! edges visited later in the same round. Rounds repeat until one of them
//! changes nothing or the round cap is reached.

use fixedbitset::FixedBitSet;
use log::{debug, warn};
use petgraph::graph::EdgeIndex;

use super::neighbors::NeighborIndex;
use crate::model::CycleSnapshot;

/// Value an absent edge compares as
const ABSENT: f64 = -1.0;

/// Summary of one diffusion run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffusionReport {
    /// Rounds run, including the final round that changed nothing
    pub rounds: usize,
    /// Edges that gained a value they did not have before diffusion
    pub interpolated: usize,
    /// `false` when the round cap stopped the run
    pub converged: bool,
}

/// Round cap used when none is configured
pub fn default_round_cap(edge_count: usize) -> usize {
    edge_count.saturating_mul(8).max(256)
}

#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10_f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// Diffuse measured values over `snapshot` until a fixed point.
///
/// Measured edges are never written. Edges with no informed neighbor stay
/// absent.
#[allow(clippy::float_cmp, clippy::cast_precision_loss)]
pub fn diffuse(
    snapshot: &mut CycleSnapshot,
    neighbors: &NeighborIndex,
    precision_digits: u32,
    max_rounds: usize,
) -> DiffusionReport {
    let entries = snapshot.entries();
    let mut measured = FixedBitSet::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        measured.set(index, entry.is_measured);
    }
    let unmeasured: Vec<usize> = measured.zeroes().collect();
    let informed_before = snapshot.informed_count();

    let mut rounds = 0;
    let mut converged = false;
    while rounds < max_rounds {
        rounds += 1;
        let mut changed = 0usize;

        for &index in &unmeasured {
            let (sum, count) = neighbors
                .neighbors(EdgeIndex::new(index))
                .iter()
                .filter_map(|neighbor| snapshot.traffic_level(*neighbor))
                .fold((0.0, 0usize), |(sum, count), level| (sum + level, count + 1));
            if count == 0 {
                continue;
            }

            let mean = sum / count as f64;
            let current = snapshot
                .traffic_level(EdgeIndex::new(index))
                .unwrap_or(ABSENT);
            if round_to(mean, precision_digits) != round_to(current, precision_digits) {
                snapshot.set_interpolated(index, mean);
                changed += 1;
            }
        }

        if changed == 0 {
            converged = true;
            break;
        }
        if rounds % 50 == 0 {
            debug!("Diffusion round {rounds}: {changed} edges changed");
        }
    }

    let interpolated = snapshot.informed_count() - informed_before;
    if converged {
        debug!("Diffusion converged after {rounds} rounds, {interpolated} edges interpolated");
    } else {
        warn!(
            "Diffusion stopped at the round cap ({max_rounds}) before converging, \
             {interpolated} edges interpolated"
        );
    }

    DiffusionReport {
        rounds,
        interpolated,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeAttributes, RoadNetwork, RoadNetworkBuilder};

    /// Straight oneway chain 1 -> 2 -> ... -> n
    fn chain(n: i64) -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        for id in 1..=n {
            b.add_node(id, 0.0, 0.001 * id as f64).unwrap();
        }
        for id in 1..n {
            b.add_edge(id, id + 1, 0, EdgeAttributes::default()).unwrap();
        }
        b.build()
    }

    /// Two disjoint edges 1 -> 2 -> 3 plus the detached 4 -> 5
    fn split_network() -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        for id in 1..=5 {
            b.add_node(id, 0.0, 0.001 * id as f64).unwrap();
        }
        b.add_edge(1, 2, 0, EdgeAttributes::default()).unwrap();
        b.add_edge(2, 3, 0, EdgeAttributes::default()).unwrap();
        b.add_edge(4, 5, 0, EdgeAttributes::default()).unwrap();
        b.build()
    }

    #[test]
    fn averages_two_neighbors_in_one_round() {
        // e0 = 1->2, e1 = 2->3, e2 = 3->4; e1 is between the measured ones
        let net = chain(4);
        let index = NeighborIndex::build(&net);
        let mut snapshot = CycleSnapshot::new("c", &net);
        snapshot.stamp(EdgeIndex::new(0), 0.4);
        snapshot.stamp(EdgeIndex::new(2), 0.6);

        let report = diffuse(&mut snapshot, &index, 3, 1);
        assert_eq!(report.rounds, 1);
        assert!(!report.converged);
        assert!((snapshot.traffic_level(EdgeIndex::new(1)).unwrap() - 0.5).abs() < 1e-12);

        let report = diffuse(&mut snapshot, &index, 3, 10);
        assert_eq!(report.rounds, 1);
        assert!(report.converged);
        assert_eq!(report.interpolated, 0);
        assert!((snapshot.traffic_level(EdgeIndex::new(1)).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn fixed_point_is_stable() {
        let net = chain(12);
        let index = NeighborIndex::build(&net);
        let mut snapshot = CycleSnapshot::new("c", &net);
        snapshot.stamp(EdgeIndex::new(0), 0.2);
        snapshot.stamp(EdgeIndex::new(10), 0.9);

        let first = diffuse(&mut snapshot, &index, 3, 1000);
        assert!(first.converged);
        assert_eq!(snapshot.informed_count(), net.edge_count());
        assert_eq!(first.interpolated, 9);

        let before: Vec<_> = snapshot.iter().map(|(_, s)| *s).collect();
        let second = diffuse(&mut snapshot, &index, 3, 1000);
        assert_eq!(second.rounds, 1);
        assert!(second.converged);
        let after: Vec<_> = snapshot.iter().map(|(_, s)| *s).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn informed_set_never_shrinks() {
        let net = chain(10);
        let index = NeighborIndex::build(&net);
        let mut snapshot = CycleSnapshot::new("c", &net);
        snapshot.stamp(EdgeIndex::new(4), 0.3);

        let mut previous = snapshot.informed_count();
        for _ in 0..10 {
            diffuse(&mut snapshot, &index, 3, 1);
            let informed = snapshot.informed_count();
            assert!(informed >= previous);
            previous = informed;
        }
        assert_eq!(previous, net.edge_count());
    }

    #[test]
    fn measured_edges_are_untouched() {
        let net = chain(6);
        let index = NeighborIndex::build(&net);
        let mut snapshot = CycleSnapshot::new("c", &net);
        snapshot.stamp(EdgeIndex::new(1), 0.123_456_789);
        snapshot.stamp(EdgeIndex::new(3), 1.7);

        diffuse(&mut snapshot, &index, 6, 1000);
        assert_eq!(
            snapshot.traffic_level(EdgeIndex::new(1)).map(f64::to_bits),
            Some(0.123_456_789_f64.to_bits())
        );
        assert_eq!(
            snapshot.traffic_level(EdgeIndex::new(3)).map(f64::to_bits),
            Some(1.7_f64.to_bits())
        );
        assert!(snapshot.get(EdgeIndex::new(1)).is_measured);
        assert!(!snapshot.get(EdgeIndex::new(2)).is_measured);
    }

    #[test]
    fn unreachable_edges_stay_absent() {
        let net = split_network();
        let index = NeighborIndex::build(&net);
        let mut snapshot = CycleSnapshot::new("c", &net);
        snapshot.stamp(EdgeIndex::new(0), 0.5);

        let report = diffuse(&mut snapshot, &index, 3, 100);
        assert!(report.converged);
        assert_eq!(snapshot.traffic_level(EdgeIndex::new(1)), Some(0.5));
        assert_eq!(snapshot.traffic_level(EdgeIndex::new(2)), None);
    }

    #[test]
    fn nothing_measured_converges_immediately() {
        let net = chain(5);
        let index = NeighborIndex::build(&net);
        let mut snapshot = CycleSnapshot::new("c", &net);
        let report = diffuse(&mut snapshot, &index, 3, default_round_cap(net.edge_count()));
        assert_eq!(report, DiffusionReport {
            rounds: 1,
            interpolated: 0,
            converged: true,
        });
    }

    #[test]
    fn change_test_rounds_halves_away_from_zero() {
        assert_eq!(round_to(0.25, 1), 0.3);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(0.123_4, 3), 0.123);
    }

    #[test]
    fn round_cap_scales_with_network() {
        assert_eq!(default_round_cap(0), 256);
        assert_eq!(default_round_cap(1000), 8000);
        assert_eq!(default_round_cap(usize::MAX), usize::MAX);
    }
}
