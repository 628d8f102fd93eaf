//! Geo-referencing: bivariate cubic polynomials plus a constant datum shift.
//!
//! A chart stores four ten-coefficient polynomials — two mapping pixel
//! coordinates to (latitude, longitude) and two mapping (longitude,
//! latitude) back to pixel eastings/northings — together with an (east,
//! north) datum shift in degrees applied between the polynomial output and
//! WGS84.

use std::io::Read;

use crate::reader::read_f64_le;
use crate::Error;

/// One bivariate cubic: `c + cx·x + cy·y + cxx·x² + cxy·x·y + cyy·y² +
/// cxxx·x³ + cxxy·x²·y + cxyy·x·y² + cyyy·y³`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct CubicPoly {
    pub(crate) c: f64,
    pub(crate) cx: f64,
    pub(crate) cy: f64,
    pub(crate) cxx: f64,
    pub(crate) cxy: f64,
    pub(crate) cyy: f64,
    pub(crate) cxxx: f64,
    pub(crate) cxxy: f64,
    pub(crate) cxyy: f64,
    pub(crate) cyyy: f64,
}

impl CubicPoly {
    /// Wire order of the eastings/northings blocks: constant, then y-major
    /// terms before their x-major counterparts within each degree.
    pub(crate) fn read_y_major(r: &mut impl Read) -> Result<Self, Error> {
        // Struct fields are evaluated in the order written
        Ok(Self {
            c: read_f64_le(r)?,
            cy: read_f64_le(r)?,
            cx: read_f64_le(r)?,
            cyy: read_f64_le(r)?,
            cxy: read_f64_le(r)?,
            cxx: read_f64_le(r)?,
            cyyy: read_f64_le(r)?,
            cxyy: read_f64_le(r)?,
            cxxy: read_f64_le(r)?,
            cxxx: read_f64_le(r)?,
        })
    }

    /// Wire order of the latitude/longitude blocks: x-major terms first.
    pub(crate) fn read_x_major(r: &mut impl Read) -> Result<Self, Error> {
        Ok(Self {
            c: read_f64_le(r)?,
            cx: read_f64_le(r)?,
            cy: read_f64_le(r)?,
            cxx: read_f64_le(r)?,
            cxy: read_f64_le(r)?,
            cyy: read_f64_le(r)?,
            cxxx: read_f64_le(r)?,
            cxxy: read_f64_le(r)?,
            cxyy: read_f64_le(r)?,
            cyyy: read_f64_le(r)?,
        })
    }

    pub(crate) fn eval(&self, x: f64, y: f64) -> f64 {
        let (x2, y2) = (x * x, y * y);
        self.c
            + self.cx * x
            + self.cy * y
            + self.cxx * x2
            + self.cxy * x * y
            + self.cyy * y2
            + self.cxxx * x2 * x
            + self.cxxy * x2 * y
            + self.cxyy * x * y2
            + self.cyyy * y2 * y
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct Georef {
    /// (longitude, latitude) → pixel x
    pub(crate) eastings: CubicPoly,
    /// (longitude, latitude) → pixel y
    pub(crate) northings: CubicPoly,
    /// (pixel x, pixel y) → latitude
    pub(crate) latitude: CubicPoly,
    /// (pixel x, pixel y) → longitude
    pub(crate) longitude: CubicPoly,
    pub(crate) datum_shift_east: f64,
    pub(crate) datum_shift_north: f64,
}

impl Georef {
    /// Full-resolution pixel coordinates to WGS84 `(lat, lon)`.
    pub(crate) fn forward(&self, x: f64, y: f64) -> (f64, f64) {
        let lat = self.latitude.eval(x, y) + self.datum_shift_north;
        let lon = self.longitude.eval(x, y) + self.datum_shift_east;
        (lat, lon)
    }

    /// WGS84 `(lat, lon)` to unrounded full-resolution pixel coordinates.
    pub(crate) fn inverse(&self, lat: f64, lon: f64) -> (f64, f64) {
        let lat = lat.clamp(-90.0, 90.0);
        // Wildly out-of-range longitudes collapse to the prime meridian
        // rather than being extrapolated
        let lon = if (-360.0..=360.0).contains(&lon) {
            lon
        } else {
            0.0
        };

        let lon = lon - self.datum_shift_east;
        let lat = lat - self.datum_shift_north;
        (
            self.eastings.eval(lon, lat),
            self.northings.eval(lon, lat),
        )
    }
}
