//! Tile-local to geographic coordinate mapping

use std::f64::consts::PI;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::{Error, TILE_EXTENT};

/// Linearly map `x` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// # Errors
///
/// Returns [`Error::DegenerateRange`] when `in_min == in_max`.
#[allow(clippy::float_cmp)]
pub fn normalize(x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> Result<f64, Error> {
    if in_min == in_max {
        return Err(Error::DegenerateRange {
            min: in_min,
            max: in_max,
        });
    }
    Ok((x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min)
}

/// Geographic bounding box of a tile, degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl TileBounds {
    /// Bounds of Web-Mercator slippy-map tile `zoom/x/y`
    pub fn from_xyz(x: u32, y: u32, zoom: u8) -> Self {
        let tiles = 2.0_f64.powi(i32::from(zoom));
        let lon = |x: f64| x * 360.0 / tiles - 180.0;
        let lat = |y: f64| (PI * (1.0 - 2.0 * y / tiles)).sinh().atan().to_degrees();

        Self {
            west: lon(f64::from(x)),
            east: lon(f64::from(x) + 1.0),
            north: lat(f64::from(y)),
            south: lat(f64::from(y) + 1.0),
        }
    }
}

/// Maps tile-local integer coordinates (x to the east, y to the north,
/// `0..extent`) onto a tile's bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileTransform {
    pub bounds: TileBounds,
    pub extent: u32,
}

impl TileTransform {
    pub fn new(bounds: TileBounds) -> Self {
        Self {
            bounds,
            extent: TILE_EXTENT,
        }
    }

    pub fn with_extent(bounds: TileBounds, extent: u32) -> Self {
        Self { bounds, extent }
    }

    /// # Errors
    ///
    /// Returns [`Error::DegenerateRange`] for an extent below 2.
    pub fn to_geographic(&self, local: Coord<f64>) -> Result<Coord<f64>, Error> {
        let max = f64::from(self.extent.saturating_sub(1));
        Ok(Coord {
            x: normalize(local.x, 0.0, max, self.bounds.west, self.bounds.east)?,
            y: normalize(local.y, 0.0, max, self.bounds.south, self.bounds.north)?,
        })
    }
}
