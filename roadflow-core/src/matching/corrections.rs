//! Manual overrides for known digitization mismatches
//!
//! Some one-way ramps are digitized so that nearest-edge search reliably
//! lands on the wrong edge, running against the measured flow. Each rule
//! names the wrongly matched `(from, to)` node pair, the edge that should
//! receive the measurement instead and any collateral edges that carry the
//! same real-world traffic.

use hashbrown::HashMap;
use petgraph::graph::EdgeIndex;
use serde::{Deserialize, Serialize};

use super::bearing::are_opposite_bearings;
use crate::{
    Error,
    model::{EdgeKey, OsmNodeId, RoadNetwork},
};

/// One row of the correction table, as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRule {
    /// Source node of the wrongly matched edge
    pub from: OsmNodeId,
    /// Target node of the wrongly matched edge
    pub to: OsmNodeId,
    pub replacement: EdgeKey,
    #[serde(default)]
    pub collateral: Vec<EdgeKey>,
    /// Only fire when the matched edge belongs to this OSM way
    #[serde(default)]
    pub osmid: Option<i64>,
}

/// A rule with its edges resolved against a network
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCorrection {
    pub replacement: EdgeIndex,
    pub collateral: Vec<EdgeIndex>,
    pub osmid: Option<i64>,
}

/// Correction rules keyed by the matched `(from, to)` node pair
#[derive(Debug, Clone, Default)]
pub struct CorrectionTable {
    rules: HashMap<(OsmNodeId, OsmNodeId), ResolvedCorrection>,
}

impl CorrectionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve rules against `network`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEdge`] if a replacement or collateral edge is
    /// missing from the network and [`Error::InvalidConfig`] if two rules
    /// share a key.
    pub fn resolve(rules: &[CorrectionRule], network: &RoadNetwork) -> Result<Self, Error> {
        let lookup = |key: &EdgeKey| network.edge_index(key).ok_or(Error::UnknownEdge(*key));

        let mut resolved = HashMap::with_capacity(rules.len());
        for rule in rules {
            let correction = ResolvedCorrection {
                replacement: lookup(&rule.replacement)?,
                collateral: rule.collateral.iter().map(lookup).collect::<Result<_, _>>()?,
                osmid: rule.osmid,
            };
            if resolved.insert((rule.from, rule.to), correction).is_some() {
                return Err(Error::InvalidConfig(format!(
                    "Duplicate correction rule for ({}, {})",
                    rule.from, rule.to
                )));
            }
        }

        Ok(Self { rules: resolved })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Find the rule that overrides the resolved match `edge`.
    ///
    /// A rule fires only while the resolved edge still runs against the
    /// segment bearing; a match that already agrees with the measured flow is
    /// left alone.
    pub fn lookup(
        &self,
        network: &RoadNetwork,
        edge: EdgeIndex,
        api_bearing: f64,
        tolerance: f64,
    ) -> Option<&ResolvedCorrection> {
        let key = network.edge_key(edge);
        let rule = self.rules.get(&(key.from, key.to))?;

        let road = network.edge(edge);
        if rule.osmid.is_some() && rule.osmid != road.osmid {
            return None;
        }
        if !are_opposite_bearings(road.bearing, api_bearing, tolerance) {
            return None;
        }
        Some(rule)
    }
}
