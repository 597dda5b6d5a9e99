use crate::models::Coordinates;
use serde::{Deserialize, Serialize};

const METERS_PER_DEGREE_LAT: f64 = 111_000.0;

/// Axis-aligned bounding box in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(rename = "south")]
    pub min_lat: f64,
    #[serde(rename = "north")]
    pub max_lat: f64,
    #[serde(rename = "west")]
    pub min_lng: f64,
    #[serde(rename = "east")]
    pub max_lng: f64,
}

impl BoundingBox {
    /// Compute a bounding box around a center point with a radius in meters.
    pub fn from_center_radius(center: &Coordinates, radius_m: f64) -> Self {
        let lat_delta = radius_m / METERS_PER_DEGREE_LAT;
        let lng_delta = lng_delta_for(center.lat, radius_m);

        BoundingBox {
            min_lat: center.lat - lat_delta,
            max_lat: center.lat + lat_delta,
            min_lng: center.lng - lng_delta,
            max_lng: center.lng + lng_delta,
        }
    }

    /// Compute a bounding box that encloses a path with a buffer in meters.
    pub fn from_path_with_buffer(path: &[Coordinates], buffer_m: f64) -> Self {
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lng = f64::INFINITY;
        let mut max_lng = f64::NEG_INFINITY;

        for coord in path {
            min_lat = min_lat.min(coord.lat);
            max_lat = max_lat.max(coord.lat);
            min_lng = min_lng.min(coord.lng);
            max_lng = max_lng.max(coord.lng);
        }

        let lat_buffer = buffer_m / METERS_PER_DEGREE_LAT;
        let lng_buffer = lng_delta_for((min_lat + max_lat) / 2.0, buffer_m);

        BoundingBox {
            min_lat: min_lat - lat_buffer,
            max_lat: max_lat + lat_buffer,
            min_lng: min_lng - lng_buffer,
            max_lng: max_lng + lng_buffer,
        }
    }

    pub fn contains(&self, point: &Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }

    /// Closed ring of `[lng, lat]` corners, counter-clockwise from south-west
    pub fn perimeter(&self) -> Vec<[f64; 2]> {
        vec![
            [self.min_lng, self.min_lat],
            [self.max_lng, self.min_lat],
            [self.max_lng, self.max_lat],
            [self.min_lng, self.max_lat],
            [self.min_lng, self.min_lat],
        ]
    }
}

impl std::str::FromStr for BoundingBox {
    type Err = String;

    /// Parse `south,west,north,east`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| format!("Invalid bounds '{}': expected south,west,north,east", s))?;

        let [south, west, north, east] = parts[..] else {
            return Err(format!(
                "Invalid bounds '{}': expected 4 values, got {}",
                s,
                parts.len()
            ));
        };

        Coordinates::new(south, west)?;
        Coordinates::new(north, east)?;
        if south >= north || west >= east {
            return Err(format!("Invalid bounds '{}': south/west must be below north/east", s));
        }

        Ok(BoundingBox {
            min_lat: south,
            max_lat: north,
            min_lng: west,
            max_lng: east,
        })
    }
}

fn lng_delta_for(lat: f64, meters: f64) -> f64 {
    let lat_delta = meters / METERS_PER_DEGREE_LAT;
    if lat.abs() > 85.0 {
        lat_delta
    } else {
        meters / (METERS_PER_DEGREE_LAT * lat.to_radians().cos())
    }
}
