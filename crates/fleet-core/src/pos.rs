//! Lattice map coordinates.
//!
//! # Design
//!
//! All positions in a match live on a 65536×65536 lattice covering the map's
//! bounding box plus a padding ring ([`LAT_LON_PADDING`] of the box size on
//! each side, so slightly out-of-border agents still quantise).  A `Pos` is
//! four bytes, compares exactly, and converts to real WGS-84 degrees through
//! the affine [`MapBounds`] transform.
//!
//! Straight-line distances come from per-map scale factors: one lattice unit
//! along each axis corresponds to a fixed number of metres, with the
//! longitude axis corrected by the cosine of the map's mean latitude.  That
//! is accurate to well under a percent at city scale, which is all the
//! snapping and A* heuristics need.

use std::fmt;

/// Padding added around the map's bounding box, as a fraction of box size
/// per side.
pub const LAT_LON_PADDING: f64 = 0.2;

/// Mean Earth radius in metres.
pub const RADIUS_EARTH: f64 = 6_371_000.0;

// ── Pos ───────────────────────────────────────────────────────────────────────

/// A point on the normalised map lattice.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Pos {
    pub lat: u16,
    pub lon: u16,
}

impl Pos {
    #[inline]
    pub fn new(lat: u16, lon: u16) -> Self {
        Pos { lat, lon }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

// ── MapBounds ─────────────────────────────────────────────────────────────────

/// The affine transform between WGS-84 degrees and the `Pos` lattice, plus
/// the metre scale of one lattice unit along each axis.
#[derive(Clone, Debug)]
pub struct MapBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    /// Metres per lattice unit along the latitude axis.
    pub scale_lat: f32,
    /// Metres per lattice unit along the longitude axis (cos-corrected).
    pub scale_lon: f32,
}

impl MapBounds {
    /// Build the transform from the map's raw bounding box.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        let mut b = MapBounds {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            scale_lat: 0.0,
            scale_lon: 0.0,
        };
        // Radius of the longitude circle at the map's mean latitude.
        let lon_radius =
            ((max_lat + min_lat) / 360.0 * std::f64::consts::PI).cos() * RADIUS_EARTH;
        let (dlat0, dlon0) = b.degrees(Pos::new(0, 0));
        let (dlat1, dlon1) = b.degrees(Pos::new(u16::MAX, u16::MAX));
        b.scale_lat =
            ((dlat1 - dlat0) / 180.0 * (RADIUS_EARTH * std::f64::consts::PI) / 65_535.0) as f32;
        b.scale_lon =
            ((dlon1 - dlon0) / 180.0 * (lon_radius * std::f64::consts::PI) / 65_535.0) as f32;
        b
    }

    /// Quantise real degrees onto the lattice.
    ///
    /// # Panics
    /// Debug-panics if the point falls outside the padded box; the padding
    /// ring exists precisely so live data never does.
    pub fn pos(&self, lat: f64, lon: f64) -> Pos {
        let lat_diff = self.max_lat - self.min_lat;
        let lon_diff = self.max_lon - self.min_lon;
        let fac = 1.0 + 2.0 * LAT_LON_PADDING;
        let lat = (lat - self.min_lat + lat_diff * LAT_LON_PADDING) / fac / lat_diff;
        let lon = (lon - self.min_lon + lon_diff * LAT_LON_PADDING) / fac / lon_diff;
        debug_assert!((0.0..1.0).contains(&lat) && (0.0..1.0).contains(&lon));
        Pos {
            lat: (lat * 65_536.0 + 0.5) as u16,
            lon: (lon * 65_536.0 + 0.5) as u16,
        }
    }

    /// The inverse map: lattice point back to real degrees.
    pub fn degrees(&self, pos: Pos) -> (f64, f64) {
        let lat_diff = self.max_lat - self.min_lat;
        let lon_diff = self.max_lon - self.min_lon;
        let lat = pos.lat as f64 / 65_536.0;
        let lon = pos.lon as f64 / 65_536.0;
        let fac = 1.0 + 2.0 * LAT_LON_PADDING;
        (
            lat * lat_diff * fac - lat_diff * LAT_LON_PADDING + self.min_lat,
            lon * lon_diff * fac - lon_diff * LAT_LON_PADDING + self.min_lon,
        )
    }

    /// Straight-line distance between two lattice points in metres.
    #[inline]
    pub fn dist_air(&self, a: Pos, b: Pos) -> f32 {
        let dlat = (a.lat as i32 - b.lat as i32) as f32 * self.scale_lat;
        let dlon = (a.lon as i32 - b.lon as i32) as f32 * self.scale_lon;
        (dlat * dlat + dlon * dlon).sqrt()
    }
}
