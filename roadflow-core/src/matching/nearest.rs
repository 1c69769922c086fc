//! Nearest-edge spatial queries

use geo::Point;
use petgraph::graph::EdgeIndex;
use rayon::prelude::*;
use rstar::{
    PointDistance, RTree,
    primitives::{GeomWithData, Line},
};

use crate::RoadNetwork;

/// Batch nearest-edge lookup over a road network.
///
/// For every query point returns the closest edge and its distance in the
/// network's coordinate units (degrees), in the same order as `points`.
/// Implementations return fewer results only when they cannot answer, which
/// callers treat as fatal for the batch.
pub trait NearestEdgeQuery {
    fn nearest_edges(&self, points: &[Point<f64>]) -> Vec<(EdgeIndex, f64)>;
}

pub type EdgeSegment = GeomWithData<Line<[f64; 2]>, EdgeIndex>;

/// R-tree over every straight piece of every edge geometry
pub struct EdgeRTree {
    tree: RTree<EdgeSegment>,
}

impl EdgeRTree {
    pub fn build(network: &RoadNetwork) -> Self {
        let pieces: Vec<EdgeSegment> = network
            .edge_indices()
            .flat_map(|edge| {
                network
                    .edge(edge)
                    .geometry
                    .lines()
                    .map(move |line| {
                        GeomWithData::new(
                            Line::new([line.start.x, line.start.y], [line.end.x, line.end.y]),
                            edge,
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        log::debug!(
            "Built edge R-tree with {} pieces for {} edges",
            pieces.len(),
            network.edge_count()
        );

        Self {
            tree: RTree::bulk_load(pieces),
        }
    }

    pub fn size(&self) -> usize {
        self.tree.size()
    }

    /// Closest edge to `point` and its distance in degrees
    pub fn nearest_edge(&self, point: Point<f64>) -> Option<(EdgeIndex, f64)> {
        let query = [point.x(), point.y()];
        self.tree
            .nearest_neighbor(&query)
            .map(|piece| (piece.data, piece.geom().distance_2(&query).sqrt()))
    }
}

impl NearestEdgeQuery for EdgeRTree {
    fn nearest_edges(&self, points: &[Point<f64>]) -> Vec<(EdgeIndex, f64)> {
        points
            .par_iter()
            .filter_map(|point| self.nearest_edge(*point))
            .collect()
    }
}
