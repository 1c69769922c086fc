//! Bearings and compass directions on lon/lat points

use std::fmt;

use geo::Point;
use serde::Serialize;

/// Initial compass bearing from `from` to `to` in degrees, [0, 360).
///
/// Points are x = longitude, y = latitude.
pub fn calculate_bearing(from: Point<f64>, to: Point<f64>) -> f64 {
    let lat1 = from.y().to_radians();
    let lat2 = to.y().to_radians();
    let delta_lon = (to.x() - from.x()).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Two bearings point in opposite directions when they differ by more than
/// `180 - tolerance` degrees.
///
/// The difference is taken around the circle, so 355° and 5° are 10° apart.
pub fn are_opposite_bearings(bearing_1: f64, bearing_2: f64, tolerance: f64) -> bool {
    angular_difference(bearing_1, bearing_2) > 180.0 - tolerance
}

/// Smallest angle between two bearings, [0, 180]
pub fn angular_difference(bearing_1: f64, bearing_2: f64) -> f64 {
    let diff = (bearing_1 - bearing_2).rem_euclid(360.0);
    if diff > 180.0 { 360.0 - diff } else { diff }
}

/// Eight-point compass direction of travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "&'static str")]
pub enum CardinalDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl CardinalDirection {
    const ALL: [CardinalDirection; 8] = [
        CardinalDirection::North,
        CardinalDirection::NorthEast,
        CardinalDirection::East,
        CardinalDirection::SouthEast,
        CardinalDirection::South,
        CardinalDirection::SouthWest,
        CardinalDirection::West,
        CardinalDirection::NorthWest,
    ];

    /// Sector `[45 * i, 45 * (i + 1))` maps to the i-th direction clockwise from north
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_bearing(bearing: f64) -> Self {
        let sector = (bearing.rem_euclid(360.0) / 45.0) as usize;
        Self::ALL[sector.min(7)]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CardinalDirection::North => "north",
            CardinalDirection::NorthEast => "north east",
            CardinalDirection::East => "east",
            CardinalDirection::SouthEast => "south east",
            CardinalDirection::South => "south",
            CardinalDirection::SouthWest => "south west",
            CardinalDirection::West => "west",
            CardinalDirection::NorthWest => "north west",
        }
    }
}

impl From<CardinalDirection> for &'static str {
    fn from(value: CardinalDirection) -> Self {
        value.as_str()
    }
}

impl fmt::Display for CardinalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
