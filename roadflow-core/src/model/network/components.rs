//! Road network components - nodes, edges and edge identity

use std::fmt;

use geo::{LineString, Point};
use serde::{Deserialize, Serialize};

/// OSM identifier of a road node
pub type OsmNodeId = i64;

/// Directional identity of an edge: `(from, to, parallel key)`.
///
/// `(u, v, k)` and `(v, u, k)` are distinct edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub from: OsmNodeId,
    pub to: OsmNodeId,
    #[serde(default)]
    pub key: u32,
}

impl EdgeKey {
    pub const fn new(from: OsmNodeId, to: OsmNodeId, key: u32) -> Self {
        Self { from, to, key }
    }

    /// Key of the twin edge running the other way with the same parallel key
    pub const fn reversed(self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            key: self.key,
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.from, self.to, self.key)
    }
}

/// Road graph node
#[derive(Debug, Clone)]
pub struct RoadNode {
    /// OSM ID of the node
    pub id: OsmNodeId,
    /// Node coordinates, x = longitude, y = latitude
    pub geometry: Point<f64>,
}

/// OSM `junction` tag of an edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Junction {
    Roundabout,
    Other(String),
}

impl From<String> for Junction {
    fn from(value: String) -> Self {
        if value == "roundabout" {
            Junction::Roundabout
        } else {
            Junction::Other(value)
        }
    }
}

impl From<Junction> for String {
    fn from(value: Junction) -> Self {
        match value {
            Junction::Roundabout => "roundabout".to_string(),
            Junction::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Junction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Junction::Roundabout => f.write_str("roundabout"),
            Junction::Other(tag) => f.write_str(tag),
        }
    }
}

/// Road graph edge (directed street segment)
#[derive(Debug, Clone)]
pub struct RoadEdge {
    /// Parallel key distinguishing edges between the same node pair
    pub key: u32,
    /// OSM way the edge was derived from
    pub osmid: Option<i64>,
    pub name: Option<String>,
    /// Polyline from the source node to the target node
    pub geometry: LineString<f64>,
    /// Compass bearing from source to target, degrees in [0, 360)
    pub bearing: f64,
    pub oneway: bool,
    /// Marks the edge as digitized against the way's canonical direction
    pub reversed: bool,
    pub junction: Option<Junction>,
    /// Raw OSM `maxspeed` tag
    pub maxspeed: Option<String>,
}

impl RoadEdge {
    pub fn is_roundabout(&self) -> bool {
        matches!(self.junction, Some(Junction::Roundabout))
    }

    /// Numeric speed limit, `None` when the tag is missing or not a plain number
    pub fn maxspeed_kph(&self) -> Option<f64> {
        self.maxspeed
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_key_swaps_endpoints_only() {
        let key = EdgeKey::new(1, 2, 3);
        assert_eq!(key.reversed(), EdgeKey::new(2, 1, 3));
        assert_eq!(key.reversed().reversed(), key);
    }

    #[test]
    fn junction_round_trips_through_strings() {
        assert_eq!(Junction::from("roundabout".to_string()), Junction::Roundabout);
        assert_eq!(
            Junction::from("circular".to_string()),
            Junction::Other("circular".to_string())
        );
        assert_eq!(String::from(Junction::Roundabout), "roundabout");
    }

    #[test]
    fn maxspeed_parses_plain_numbers() {
        let mut edge = RoadEdge {
            key: 0,
            osmid: None,
            name: None,
            geometry: LineString::new(vec![]),
            bearing: 0.0,
            oneway: false,
            reversed: false,
            junction: None,
            maxspeed: Some("50".to_string()),
        };
        assert_eq!(edge.maxspeed_kph(), Some(50.0));
        edge.maxspeed = Some("50 mph".to_string());
        assert_eq!(edge.maxspeed_kph(), None);
    }
}
