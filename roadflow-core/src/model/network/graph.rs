use hashbrown::HashMap;
use petgraph::{
    Direction,
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};

use super::components::{EdgeKey, OsmNodeId, RoadEdge, RoadNode};

pub type RoadGraph = DiGraph<RoadNode, RoadEdge>;

/// Directed road multigraph with lookups from OSM identity to arena indices.
///
/// Edge attributes never change once the network is built, so a network can
/// be shared by reference across any number of cycles. Use
/// [`RoadNetworkBuilder`](super::RoadNetworkBuilder) to construct one.
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    pub(super) graph: RoadGraph,
    pub(super) node_lookup: HashMap<OsmNodeId, NodeIndex>,
    pub(super) edge_lookup: HashMap<EdgeKey, EdgeIndex>,
}

impl RoadNetwork {
    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    pub fn node(&self, node: NodeIndex) -> &RoadNode {
        &self.graph[node]
    }

    pub fn node_index(&self, id: OsmNodeId) -> Option<NodeIndex> {
        self.node_lookup.get(&id).copied()
    }

    pub fn edge(&self, edge: EdgeIndex) -> &RoadEdge {
        &self.graph[edge]
    }

    pub fn edge_index(&self, key: &EdgeKey) -> Option<EdgeIndex> {
        self.edge_lookup.get(key).copied()
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    /// Source and target node of an edge
    pub fn endpoints(&self, edge: EdgeIndex) -> (NodeIndex, NodeIndex) {
        let raw = &self.graph.raw_edges()[edge.index()];
        (raw.source(), raw.target())
    }

    pub fn edge_key(&self, edge: EdgeIndex) -> EdgeKey {
        let (source, target) = self.endpoints(edge);
        EdgeKey::new(
            self.graph[source].id,
            self.graph[target].id,
            self.graph[edge].key,
        )
    }

    /// The `(v, u, k)` twin of edge `(u, v, k)`, if the network has one
    pub fn reverse_twin(&self, edge: EdgeIndex) -> Option<EdgeIndex> {
        self.edge_index(&self.edge_key(edge).reversed())
    }

    /// Every edge touching `node`, outgoing first, then incoming
    pub fn incident_edges(&self, node: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .chain(self.graph.edges_directed(node, Direction::Incoming))
            .map(|edge| edge.id())
    }
}
