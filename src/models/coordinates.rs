use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, String> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(format!(
                "Invalid latitude: {} (must be between -90 and 90)",
                lat
            ));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(format!(
                "Invalid longitude: {} (must be between -180 and 180)",
                lng
            ));
        }
        Ok(Coordinates { lat, lng })
    }

    /// Build from a GeoJSON-ordered `[lng, lat]` pair
    pub fn from_lng_lat(pair: [f64; 2]) -> Result<Self, String> {
        Self::new(pair[1], pair[0])
    }

    /// GeoJSON-ordered `[lng, lat]` pair
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }

    /// Great-circle distance in meters
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        Haversine.distance(self.to_point(), other.to_point())
    }

    /// Point a fraction `t` (0..=1) of the way towards `other`.
    /// Linear in lat/lng, which is accurate at street scale.
    pub fn lerp(&self, other: &Coordinates, t: f64) -> Coordinates {
        Coordinates {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }

    /// Distance (meters) from this point to a line segment
    fn distance_to_segment_m(&self, p1: &Coordinates, p2: &Coordinates) -> f64 {
        let dx = p2.lng - p1.lng;
        let dy = p2.lat - p1.lat;
        let len_sq = dx * dx + dy * dy;

        if len_sq < 1e-20 {
            return self.distance_m(p1);
        }

        // Projection in lat/lng space, clamped onto the segment
        let t = (((self.lng - p1.lng) * dx + (self.lat - p1.lat) * dy) / len_sq).clamp(0.0, 1.0);
        self.distance_m(&p1.lerp(p2, t))
    }

    /// Minimum distance (meters) from this point to a path.
    /// A single-point path degenerates to point distance; empty paths yield `None`.
    pub fn distance_to_path_m(&self, path: &[Coordinates]) -> Option<f64> {
        match path {
            [] => None,
            [only] => Some(self.distance_m(only)),
            _ => path
                .windows(2)
                .map(|w| self.distance_to_segment_m(&w[0], &w[1]))
                .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)),
        }
    }
}
