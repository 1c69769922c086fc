//! Topological adjacency between directed edges

use itertools::Itertools;
use petgraph::graph::EdgeIndex;
use rayon::prelude::*;

use crate::RoadNetwork;

/// For every edge, the edges sharing one of its endpoints, excluding the
/// edge itself and its `(v, u, k)` twin.
///
/// Stored as one flat list with per-edge offsets; each edge's slice is sorted
/// by edge index. Built once per network and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct NeighborIndex {
    offsets: Vec<usize>,
    neighbors: Vec<EdgeIndex>,
}

impl NeighborIndex {
    pub fn build(network: &RoadNetwork) -> Self {
        let lists: Vec<Vec<EdgeIndex>> = (0..network.edge_count())
            .into_par_iter()
            .map(|index| {
                let edge = EdgeIndex::new(index);
                let (source, target) = network.endpoints(edge);
                let twin = network.reverse_twin(edge);

                network
                    .incident_edges(source)
                    .chain(network.incident_edges(target))
                    .filter(|other| *other != edge && Some(*other) != twin)
                    .sorted_unstable()
                    .dedup()
                    .collect()
            })
            .collect();

        let mut offsets = Vec::with_capacity(lists.len() + 1);
        offsets.push(0);
        for list in &lists {
            offsets.push(offsets[offsets.len() - 1] + list.len());
        }

        let index = Self {
            offsets,
            neighbors: lists.into_iter().flatten().collect(),
        };
        log::debug!(
            "Built neighbor index: {} edges, {} adjacencies",
            index.len(),
            index.neighbors.len()
        );
        index
    }

    /// Neighbors of `edge`, ascending by index
    pub fn neighbors(&self, edge: EdgeIndex) -> &[EdgeIndex] {
        let index = edge.index();
        &self.neighbors[self.offsets[index]..self.offsets[index + 1]]
    }

    /// Number of edges covered
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn adjacency_count(&self) -> usize {
        self.neighbors.len()
    }
}
