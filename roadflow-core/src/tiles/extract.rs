//! Segment extraction from decoded tile features

use std::collections::BTreeMap;

use geo::{Coord, Point};
use itertools::Itertools;
use log::{debug, trace};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::normalize::{TileBounds, TileTransform};
use crate::{
    Error,
    model::{MeasuredSegment, SegmentId},
};

/// Geometry of a decoded feature, coordinates kept raw until interpreted
#[derive(Debug, Clone, Deserialize)]
pub struct TileGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: JsonValue,
}

/// A decoded tile feature: geometry plus property map
#[derive(Debug, Clone, Deserialize)]
pub struct TileFeature {
    #[serde(default)]
    pub geometry: Option<TileGeometry>,
    #[serde(default)]
    pub properties: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TileLayer {
    #[serde(default)]
    pub extent: Option<u32>,
    #[serde(default)]
    pub features: Vec<TileFeature>,
}

/// Decoded vector tile: layer name to layer
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct DecodedTile {
    pub layers: BTreeMap<String, TileLayer>,
}

impl DecodedTile {
    /// # Errors
    ///
    /// Returns an error on malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn feature_count(&self) -> usize {
        self.layers.values().map(|layer| layer.features.len()).sum()
    }
}

impl TileFeature {
    fn traffic_level(&self, property: &str) -> Option<f64> {
        self.properties.get(property).and_then(JsonValue::as_f64)
    }

    /// Line parts of the geometry, `None` for points and unsupported shapes
    fn lines(&self) -> Option<Vec<Vec<Coord<f64>>>> {
        let geometry = self.geometry.as_ref()?;
        match geometry.kind.as_str() {
            "LineString" => {
                let raw: Vec<Vec<f64>> = serde_json::from_value(geometry.coordinates.clone()).ok()?;
                Some(vec![to_coords(raw)?])
            }
            "MultiLineString" => {
                let raw: Vec<Vec<Vec<f64>>> =
                    serde_json::from_value(geometry.coordinates.clone()).ok()?;
                raw.into_iter().map(to_coords).collect()
            }
            _ => None,
        }
    }
}

fn to_coords(raw: Vec<Vec<f64>>) -> Option<Vec<Coord<f64>>> {
    raw.into_iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect()
}

/// Split tile features into atomic two-point segments in geographic
/// coordinates.
///
/// Points, unsupported geometries and features without a numeric traffic
/// property are skipped. Every emitted segment takes the next id from
/// `next_id`, in feature then point order.
///
/// # Errors
///
/// Returns an error only for a degenerate tile transform.
pub fn extract_segments<'a>(
    features: impl IntoIterator<Item = &'a TileFeature>,
    transform: &TileTransform,
    traffic_property: &str,
    next_id: &mut SegmentId,
) -> Result<Vec<MeasuredSegment>, Error> {
    let mut segments = Vec::new();

    for feature in features {
        let Some(lines) = feature.lines() else {
            trace!("Skipping feature without line geometry");
            continue;
        };
        let Some(traffic_level) = feature.traffic_level(traffic_property) else {
            trace!("Skipping feature without '{traffic_property}' property");
            continue;
        };

        for line in lines {
            for (start, end) in line.into_iter().tuple_windows() {
                let start = transform.to_geographic(start)?;
                let end = transform.to_geographic(end)?;
                segments.push(MeasuredSegment::new(
                    *next_id,
                    Point(start),
                    Point(end),
                    traffic_level,
                ));
                *next_id += 1;
            }
        }
    }

    Ok(segments)
}

/// Read segments from features that already hold one geographic coordinate
/// pair each, such as a previous diagnostics export.
///
/// Features that do not carry exactly two positions are skipped.
pub fn segments_from_pairs<'a>(
    features: impl IntoIterator<Item = &'a TileFeature>,
    traffic_property: &str,
    next_id: &mut SegmentId,
) -> Vec<MeasuredSegment> {
    features
        .into_iter()
        .filter_map(|feature| {
            let mut lines = feature.lines()?;
            if lines.len() != 1 || lines[0].len() != 2 {
                return None;
            }
            let traffic_level = feature.traffic_level(traffic_property)?;
            let line = lines.pop()?;
            let segment = MeasuredSegment::new(*next_id, Point(line[0]), Point(line[1]), traffic_level);
            *next_id += 1;
            Some(segment)
        })
        .collect()
}

/// Extract and merge the segments of several tiles of one cycle, numbering
/// them sequentially across tiles. A layer's own extent overrides the
/// default tile extent.
///
/// # Errors
///
/// Returns an error for a degenerate tile extent.
pub fn merge_tiles<'a>(
    tiles: impl IntoIterator<Item = (&'a DecodedTile, TileBounds)>,
    traffic_property: &str,
) -> Result<Vec<MeasuredSegment>, Error> {
    let mut next_id: SegmentId = 0;
    let mut merged = Vec::new();

    for (tile, bounds) in tiles {
        for (name, layer) in &tile.layers {
            let transform = match layer.extent {
                Some(extent) => TileTransform::with_extent(bounds, extent),
                None => TileTransform::new(bounds),
            };
            let segments =
                extract_segments(&layer.features, &transform, traffic_property, &mut next_id)?;
            debug!(
                "Layer '{name}': {} features -> {} segments",
                layer.features.len(),
                segments.len()
            );
            merged.extend(segments);
        }
    }

    Ok(merged)
}
