use std::fmt;

use crate::parse::Point;

/// Running min/max of latitude and longitude plus a valid-point counter.
///
/// While `point_count` is zero the extrema hold infinity sentinels and must
/// not be read as coordinates. Merging is commutative and associative, so
/// per-shard accumulators can be folded together in any order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    pub point_count: u64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            point_count: 0,
        }
    }
}

impl Bounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64, point_count: u64) -> Self {
        Self { min_lat, max_lat, min_lon, max_lon, point_count }
    }

    /// Fold one accepted point into the running extrema.
    pub fn update(&mut self, p: Point) {
        self.min_lat = f64::min(self.min_lat, p.lat);
        self.max_lat = f64::max(self.max_lat, p.lat);
        self.min_lon = f64::min(self.min_lon, p.lon);
        self.max_lon = f64::max(self.max_lon, p.lon);
        self.point_count += 1;
    }

    /// Combine two partial accumulators: componentwise min/max, summed counts.
    pub fn merge(&mut self, other: &Bounds) {
        self.min_lat = f64::min(self.min_lat, other.min_lat);
        self.max_lat = f64::max(self.max_lat, other.max_lat);
        self.min_lon = f64::min(self.min_lon, other.min_lon);
        self.max_lon = f64::max(self.max_lon, other.max_lon);
        self.point_count += other.point_count;
    }

    pub fn is_valid(&self) -> bool {
        self.point_count > 0
            && self.min_lat.is_finite()
            && self.max_lat.is_finite()
            && self.min_lon.is_finite()
            && self.max_lon.is_finite()
    }

    /// A dataset with a single location (or all points coincident) has no
    /// range; rendering still proceeds, but with everything in one cell.
    pub fn has_range(&self) -> bool {
        self.is_valid() && (self.max_lat > self.min_lat || self.max_lon > self.min_lon)
    }

    pub fn lat_range(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_range(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn contains(&self, p: Point) -> bool {
        p.lat >= self.min_lat
            && p.lat <= self.max_lat
            && p.lon >= self.min_lon
            && p.lon <= self.max_lon
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bounds [Lat: {:.4} to {:.4}, Lon: {:.4} to {:.4}], Points: {}",
            self.min_lat, self.max_lat, self.min_lon, self.max_lon, self.point_count
        )
    }
}
