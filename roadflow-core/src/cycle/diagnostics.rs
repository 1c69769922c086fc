//! Per-segment matching annotations and their `GeoJSON` export

use geo::LineString;
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use crate::{
    Error, MeasuredSegment,
    matching::CardinalDirection,
    model::{EdgeKey, Junction},
};

/// What the first matching pass found out about one extracted segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDiagnostics {
    pub segment: MeasuredSegment,
    pub nearest_edge: EdgeKey,
    pub distance_m: f64,
    /// Why the segment took no further part in the cycle
    pub error: Option<&'static str>,
    pub api_bearing: f64,
    /// Compass direction the segment travels in
    pub aiming: CardinalDirection,
    /// Segment runs against the canonical direction of the matched way
    pub nearest_edge_reverse: bool,
    /// Split marker, `None` for dropped segments
    pub splits: Option<i64>,
    pub junction: Option<Junction>,
}

impl SegmentDiagnostics {
    fn to_feature(&self) -> Result<Feature, Error> {
        let line = LineString::from(vec![self.segment.start.0, self.segment.end.0]);
        let geometry = Geometry::new(GeoJsonValue::from(&line));

        let value = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": {
                "id": self.segment.id,
                "parent": self.segment.parent,
                "traffic_level": self.segment.traffic_level,
                "nearest_edge": [self.nearest_edge.from, self.nearest_edge.to, self.nearest_edge.key],
                "distance": self.distance_m,
                "error": self.error,
                "api_bearing": self.api_bearing,
                "aiming": self.aiming,
                "nearest_edge_reverse": self.nearest_edge_reverse,
                "splits": self.splits,
                "junction": self.junction.as_ref().map(ToString::to_string),
            }
        });

        serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}

/// Export diagnostics as one `LineString` feature per segment
///
/// # Errors
///
/// Returns [`Error::GeoJsonError`] if a feature cannot be assembled.
pub fn diagnostics_to_geojson(diagnostics: &[SegmentDiagnostics]) -> Result<FeatureCollection, Error> {
    let features = diagnostics
        .iter()
        .map(SegmentDiagnostics::to_feature)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}
