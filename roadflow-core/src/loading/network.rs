//! Road network loading from node-link JSON
//!
//! ```json
//! {
//!   "nodes": [{ "id": 1, "lat": 36.71, "lon": -4.47 }],
//!   "links": [{ "source": 1, "target": 2, "key": 0, "oneway": false,
//!               "reversed": false, "bearing": 87.5, "osmid": 4321,
//!               "junction": "roundabout", "maxspeed": "50",
//!               "geometry": [[-4.47, 36.71], [-4.469, 36.711]] }]
//! }
//! ```

use std::{fs::File, io::BufReader, path::Path};

use geo::{Coord, LineString};
use log::info;
use serde::Deserialize;

use crate::{
    Error,
    model::{EdgeAttributes, Junction, OsmNodeId, RoadNetwork, RoadNetworkBuilder},
};

#[derive(Debug, Deserialize)]
struct NodeLinkDocument {
    nodes: Vec<RawNode>,
    links: Vec<RawLink>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    id: OsmNodeId,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    source: OsmNodeId,
    target: OsmNodeId,
    #[serde(default)]
    key: u32,
    #[serde(default)]
    osmid: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    bearing: Option<f64>,
    #[serde(default)]
    oneway: bool,
    #[serde(default)]
    reversed: bool,
    #[serde(default)]
    junction: Option<Junction>,
    #[serde(default)]
    maxspeed: Option<String>,
    /// `[lon, lat]` pairs
    #[serde(default)]
    geometry: Option<Vec<[f64; 2]>>,
}

/// Parse a road network from a node-link JSON string
///
/// # Errors
///
/// Returns an error on malformed JSON, links to unknown nodes, duplicate
/// identifiers or geometries with fewer than two points.
pub fn network_from_json_str(json: &str) -> Result<RoadNetwork, Error> {
    let document: NodeLinkDocument = serde_json::from_str(json)?;
    build_network(document)
}

/// Load a road network from a node-link JSON file
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content is invalid.
pub fn load_network(path: &Path) -> Result<RoadNetwork, Error> {
    let file = File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open network '{}': {}", path.display(), e),
        )
    })?;
    let document: NodeLinkDocument = serde_json::from_reader(BufReader::new(file))?;
    let network = build_network(document)?;
    info!(
        "Loaded road network from {}: {} nodes, {} edges",
        path.display(),
        network.node_count(),
        network.edge_count()
    );
    Ok(network)
}

fn build_network(document: NodeLinkDocument) -> Result<RoadNetwork, Error> {
    let mut builder = RoadNetworkBuilder::with_capacity(document.nodes.len(), document.links.len());

    for node in document.nodes {
        builder.add_node(node.id, node.lat, node.lon)?;
    }

    for link in document.links {
        let geometry = match link.geometry {
            Some(points) if points.len() < 2 => {
                return Err(Error::InvalidData(format!(
                    "Edge ({}, {}, {}) has a geometry with {} point(s)",
                    link.source,
                    link.target,
                    link.key,
                    points.len()
                )));
            }
            Some(points) => Some(LineString::new(
                points.into_iter().map(|[x, y]| Coord { x, y }).collect(),
            )),
            None => None,
        };

        builder.add_edge(link.source, link.target, link.key, EdgeAttributes {
            osmid: link.osmid,
            name: link.name,
            geometry,
            bearing: link.bearing,
            oneway: link.oneway,
            reversed: link.reversed,
            junction: link.junction,
            maxspeed: link.maxspeed,
        })?;
    }

    Ok(builder.build())
}
