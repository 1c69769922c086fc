use geo::{LineString, Point};
use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex};

use super::components::{EdgeKey, Junction, OsmNodeId, RoadEdge, RoadNode};
use super::graph::{RoadGraph, RoadNetwork};
use crate::{Error, matching::bearing::calculate_bearing};

/// Optional edge attributes accepted by [`RoadNetworkBuilder::add_edge`].
///
/// A missing `bearing` is computed from the endpoint positions and a missing
/// `geometry` becomes the straight line between them.
#[derive(Debug, Clone, Default)]
pub struct EdgeAttributes {
    pub osmid: Option<i64>,
    pub name: Option<String>,
    pub geometry: Option<LineString<f64>>,
    pub bearing: Option<f64>,
    pub oneway: bool,
    pub reversed: bool,
    pub junction: Option<Junction>,
    pub maxspeed: Option<String>,
}

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use roadflow_core::model::{EdgeAttributes, RoadNetworkBuilder};
///
/// let mut b = RoadNetworkBuilder::new();
/// b.add_node(1, 36.7150, -4.4700).unwrap();
/// b.add_node(2, 36.7150, -4.4690).unwrap();
/// b.add_two_way(1, 2, EdgeAttributes::default()).unwrap();
/// let net = b.build();
/// assert_eq!(net.edge_count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct RoadNetworkBuilder {
    graph: RoadGraph,
    node_lookup: HashMap<OsmNodeId, NodeIndex>,
    edge_lookup: HashMap<EdgeKey, EdgeIndex>,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: RoadGraph::with_capacity(nodes, edges),
            node_lookup: HashMap::with_capacity(nodes),
            edge_lookup: HashMap::with_capacity(edges),
        }
    }

    /// Add a node at `(lat, lon)`.
    ///
    /// # Errors
    ///
    /// Returns an error if a node with the same id was already added.
    pub fn add_node(&mut self, id: OsmNodeId, lat: f64, lon: f64) -> Result<NodeIndex, Error> {
        if self.node_lookup.contains_key(&id) {
            return Err(Error::InvalidData(format!("Duplicate node {id}")));
        }
        let index = self.graph.add_node(RoadNode {
            id,
            geometry: Point::new(lon, lat),
        });
        self.node_lookup.insert(id, index);
        Ok(index)
    }

    /// Add the directed edge `(from, to, key)`.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is unknown or the key is already taken.
    pub fn add_edge(
        &mut self,
        from: OsmNodeId,
        to: OsmNodeId,
        key: u32,
        attributes: EdgeAttributes,
    ) -> Result<EdgeIndex, Error> {
        let edge_key = EdgeKey::new(from, to, key);
        if self.edge_lookup.contains_key(&edge_key) {
            return Err(Error::InvalidData(format!("Duplicate edge {edge_key}")));
        }
        let source = *self.node_lookup.get(&from).ok_or(Error::UnknownNode(from))?;
        let target = *self.node_lookup.get(&to).ok_or(Error::UnknownNode(to))?;

        let from_pos = self.graph[source].geometry;
        let to_pos = self.graph[target].geometry;

        let geometry = attributes
            .geometry
            .unwrap_or_else(|| LineString::from(vec![from_pos.0, to_pos.0]));
        let bearing = attributes
            .bearing
            .unwrap_or_else(|| calculate_bearing(from_pos, to_pos));

        let index = self.graph.add_edge(
            source,
            target,
            RoadEdge {
                key,
                osmid: attributes.osmid,
                name: attributes.name,
                geometry,
                bearing,
                oneway: attributes.oneway,
                reversed: attributes.reversed,
                junction: attributes.junction,
                maxspeed: attributes.maxspeed,
            },
        );
        self.edge_lookup.insert(edge_key, index);
        Ok(index)
    }

    /// Convenience: add `(a, b, 0)` and its reversed twin `(b, a, 0)` for a
    /// two-way street. The twin is flagged `reversed` and carries the
    /// reversed geometry.
    pub fn add_two_way(
        &mut self,
        a: OsmNodeId,
        b: OsmNodeId,
        attributes: EdgeAttributes,
    ) -> Result<(EdgeIndex, EdgeIndex), Error> {
        let mut backward = attributes.clone();
        backward.reversed = !attributes.reversed;
        backward.bearing = None;
        backward.geometry = attributes.geometry.as_ref().map(|line| {
            let mut coords = line.0.clone();
            coords.reverse();
            LineString::new(coords)
        });

        let forward = self.add_edge(a, b, 0, EdgeAttributes {
            oneway: false,
            ..attributes
        })?;
        let backward = self.add_edge(b, a, 0, EdgeAttributes {
            oneway: false,
            ..backward
        })?;
        Ok((forward, backward))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn build(self) -> RoadNetwork {
        RoadNetwork {
            graph: self.graph,
            node_lookup: self.node_lookup,
            edge_lookup: self.edge_lookup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> RoadNetworkBuilder {
        let mut b = RoadNetworkBuilder::new();
        b.add_node(1, 0.0, 0.0).unwrap();
        b.add_node(2, 0.0, 0.001).unwrap();
        b.add_node(3, 0.001, 0.001).unwrap();
        b
    }

    #[test]
    fn two_way_adds_reversed_twin() {
        let mut b = square();
        let (fwd, bwd) = b.add_two_way(1, 2, EdgeAttributes::default()).unwrap();
        let net = b.build();

        assert_eq!(net.edge_count(), 2);
        assert_eq!(net.reverse_twin(fwd), Some(bwd));
        assert_eq!(net.reverse_twin(bwd), Some(fwd));
        assert!(!net.edge(fwd).reversed);
        assert!(net.edge(bwd).reversed);
        assert_eq!(net.edge_key(bwd), EdgeKey::new(2, 1, 0));
    }

    #[test]
    fn bearing_defaults_to_endpoint_bearing() {
        let mut b = square();
        let east = b.add_edge(1, 2, 0, EdgeAttributes::default()).unwrap();
        let north = b.add_edge(2, 3, 0, EdgeAttributes::default()).unwrap();
        let net = b.build();

        assert!((net.edge(east).bearing - 90.0).abs() < 1e-6);
        assert!(net.edge(north).bearing.abs() < 1e-6);
    }

    #[test]
    fn unknown_node_is_rejected() {
        let mut b = square();
        let err = b.add_edge(1, 99, 0, EdgeAttributes::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownNode(99)));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut b = square();
        b.add_edge(1, 2, 0, EdgeAttributes::default()).unwrap();
        assert!(b.add_edge(1, 2, 0, EdgeAttributes::default()).is_err());
        // A parallel edge with another key is fine
        assert!(b.add_edge(1, 2, 1, EdgeAttributes::default()).is_ok());
        assert!(b.add_node(1, 5.0, 5.0).is_err());
    }

    #[test]
    fn oneway_edge_has_no_twin() {
        let mut b = square();
        let e = b
            .add_edge(1, 2, 0, EdgeAttributes {
                oneway: true,
                ..EdgeAttributes::default()
            })
            .unwrap();
        let net = b.build();
        assert_eq!(net.reverse_twin(e), None);
    }
}
