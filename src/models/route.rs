use crate::constants::MAX_ASSESSMENT_COORDINATES;
use crate::models::{Coordinates, CrimeFilters, RiskLevel, TimeWindow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Walking,
    Cycling,
    Driving,
}

impl TransportMode {
    /// Returns the Mapbox profile name for this transport mode
    pub fn mapbox_profile(&self) -> &str {
        match self {
            TransportMode::Walking => "walking",
            TransportMode::Cycling => "cycling",
            TransportMode::Driving => "driving",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mapbox_profile())
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "walk" | "walking" => Ok(TransportMode::Walking),
            "bike" | "cycling" | "bicycle" => Ok(TransportMode::Cycling),
            "drive" | "driving" | "car" => Ok(TransportMode::Driving),
            _ => Err(format!(
                "Invalid transport mode: {}. Use 'walking', 'cycling' or 'driving'",
                s
            )),
        }
    }
}

/// Endpoint of a requested route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutePoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl RoutePoint {
    pub fn coordinates(&self) -> Result<Coordinates, String> {
        Coordinates::new(self.lat, self.lng)
    }
}

/// Maximal run of consecutive samples sharing one risk level
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    pub start_index: usize,
    pub end_index: usize,
    /// `[lng, lat]` pairs
    pub coordinates: Vec<[f64; 2]>,
    pub risk_level: RiskLevel,
    pub crime_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteOverallAssessment {
    pub risk_level: RiskLevel,
    pub safety_score: f64,
    /// Sum of per-sample counts; incidents near several samples count more than once
    pub total_crime_count: i64,
    /// Distinct incidents near the route
    pub route_crime_count: i64,
    pub high_risk_segments: usize,
    pub medium_risk_segments: usize,
    pub low_risk_segments: usize,
    pub recommendations: Vec<String>,
    /// Meters, when the route came from the routing provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Seconds, when the route came from the routing provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSafetyReport {
    pub segments: Vec<RouteSegment>,
    pub overall_assessment: RouteOverallAssessment,
}

/// Body of `POST /bigquery/route-assessment`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAssessmentRequest {
    /// `[lng, lat]` samples along the route
    pub coordinates: Vec<[f64; 2]>,
    #[serde(default)]
    pub filters: Option<CrimeFilters>,
    #[serde(default)]
    pub time: Option<TimeWindow>,
}

impl RouteAssessmentRequest {
    /// Validate and convert the samples
    pub fn validate(&self) -> Result<Vec<Coordinates>, String> {
        if self.coordinates.len() < 2 {
            return Err("At least 2 route coordinates are required".to_string());
        }
        if self.coordinates.len() > MAX_ASSESSMENT_COORDINATES {
            return Err(format!(
                "At most {} route coordinates are allowed",
                MAX_ASSESSMENT_COORDINATES
            ));
        }
        if let Some(filters) = &self.filters {
            filters.date_range()?;
        }
        if let Some(time) = &self.time {
            time.validate()?;
        }

        self.coordinates
            .iter()
            .enumerate()
            .map(|(i, pair)| {
                Coordinates::from_lng_lat(*pair).map_err(|e| format!("coordinates[{}]: {}", i, e))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAssessmentResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: RouteSafetyReport,
}

/// Body of `POST /routes/safe`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeRouteRequest {
    pub origin: RoutePoint,
    pub destination: RoutePoint,
    #[serde(default)]
    pub mode: TransportMode,
    #[serde(default)]
    pub filters: Option<CrimeFilters>,
    #[serde(default)]
    pub time: Option<TimeWindow>,
}

impl SafeRouteRequest {
    pub fn validate(&self) -> Result<(Coordinates, Coordinates), String> {
        let origin = self.origin.coordinates().map_err(|e| format!("origin: {}", e))?;
        let destination = self
            .destination
            .coordinates()
            .map_err(|e| format!("destination: {}", e))?;
        if let Some(filters) = &self.filters {
            filters.date_range()?;
        }
        if let Some(time) = &self.time {
            time.validate()?;
        }
        Ok((origin, destination))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeRouteResponse {
    pub success: bool,
    pub origin: RoutePoint,
    pub destination: RoutePoint,
    pub mode: TransportMode,
    /// Full routed polyline as `[lng, lat]` pairs
    pub geometry: Vec<[f64; 2]>,
    /// The samples the assessment was computed over
    pub samples: Vec<[f64; 2]>,
    #[serde(flatten)]
    pub report: RouteSafetyReport,
}
