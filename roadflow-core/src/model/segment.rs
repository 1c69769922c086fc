use geo::{Distance, Euclidean, Point};

use crate::{TrafficLevel, matching::bearing::calculate_bearing};

pub type SegmentId = usize;

/// Atomic two-point measured line, x = longitude, y = latitude
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredSegment {
    pub id: SegmentId,
    /// Segment this one was split from, if any
    pub parent: Option<SegmentId>,
    pub start: Point<f64>,
    pub end: Point<f64>,
    pub traffic_level: TrafficLevel,
}

impl MeasuredSegment {
    pub fn new(id: SegmentId, start: Point<f64>, end: Point<f64>, traffic_level: TrafficLevel) -> Self {
        Self {
            id,
            parent: None,
            start,
            end,
            traffic_level,
        }
    }

    pub fn midpoint(&self) -> Point<f64> {
        Point::new(
            (self.start.x() + self.end.x()) / 2.0,
            (self.start.y() + self.end.y()) / 2.0,
        )
    }

    /// Planar length scaled by `degrees_to_meters`
    pub fn length_m(&self, degrees_to_meters: f64) -> f64 {
        Euclidean.distance(self.start, self.end) * degrees_to_meters
    }

    /// Compass bearing from `start` to `end`
    pub fn bearing(&self) -> f64 {
        calculate_bearing(self.start, self.end)
    }
}
