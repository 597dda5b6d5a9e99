use crate::error::{AppError, Result};
use crate::models::{Coordinates, TransportMode};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const MAPBOX_DIRECTIONS_BASE_URL: &str = "https://api.mapbox.com/directions/v5/mapbox";

/// Mapbox caps a directions request at 25 coordinates
const MAX_WAYPOINTS: usize = 25;

/// How the client authenticates with the directions API.
#[derive(Clone, Debug)]
pub enum AuthMode {
    /// `access_token` query param (direct Mapbox)
    DirectToken,
    /// `Authorization: Bearer` header, for a proxy in front of Mapbox
    BearerHeader,
}

/// Anything that can turn waypoints into a routed polyline
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn get_directions(
        &self,
        waypoints: &[Coordinates],
        mode: TransportMode,
    ) -> Result<DirectionsResponse>;
}

#[derive(Clone)]
pub struct MapboxClient {
    client: Client,
    api_key: String,
    base_url: String,
    auth_mode: AuthMode,
}

impl MapboxClient {
    pub fn new(api_key: String) -> Self {
        Self::with_config(api_key, MAPBOX_DIRECTIONS_BASE_URL.to_string(), AuthMode::DirectToken)
    }

    pub fn with_config(api_key: String, base_url: String, auth_mode: AuthMode) -> Self {
        MapboxClient {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_mode,
        }
    }

    fn directions_url(&self, waypoints: &[Coordinates], mode: TransportMode) -> String {
        // "lng,lat;lng,lat;..."
        let path = waypoints
            .iter()
            .map(|c| format!("{},{}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!("{}/{}/{}", self.base_url, mode.mapbox_profile(), path)
    }
}

#[async_trait]
impl DirectionsProvider for MapboxClient {
    /// First route between the waypoints, with full GeoJSON geometry
    async fn get_directions(
        &self,
        waypoints: &[Coordinates],
        mode: TransportMode,
    ) -> Result<DirectionsResponse> {
        if waypoints.len() < 2 {
            return Err(AppError::InvalidRequest(
                "At least 2 waypoints required".to_string(),
            ));
        }
        if waypoints.len() > MAX_WAYPOINTS {
            return Err(AppError::InvalidRequest(format!(
                "Maximum {} waypoints allowed",
                MAX_WAYPOINTS
            )));
        }

        let url = self.directions_url(waypoints, mode);

        tracing::debug!(
            waypoints = waypoints.len(),
            mode = %mode,
            "Mapbox directions request: {} waypoints, profile {}",
            waypoints.len(),
            mode
        );

        let mut request = self.client.get(&url).query(&[
            ("geometries", "geojson"),
            ("overview", "full"),
            ("steps", "false"),
        ]);

        request = match self.auth_mode {
            AuthMode::DirectToken => request.query(&[("access_token", &self.api_key)]),
            AuthMode::BearerHeader => request.bearer_auth(&self.api_key),
        };

        let response = request
            .send()
            .await
            .map_err(|e| AppError::MapboxApi(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = %status,
                mode = %mode,
                "Mapbox directions HTTP error {}: {}",
                status,
                error_text
            );
            return Err(AppError::MapboxApi(format!("HTTP {}: {}", status, error_text)));
        }

        let directions: MapboxDirectionsApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::MapboxApi(format!("Failed to parse response: {}", e)))?;

        directions.into_first_route().ok_or_else(|| {
            tracing::warn!(mode = %mode, "Mapbox returned no route");
            AppError::MapboxApi("No routes found".to_string())
        })
    }
}

#[derive(Debug, Deserialize)]
struct MapboxDirectionsApiResponse {
    routes: Vec<MapboxRoute>,
}

impl MapboxDirectionsApiResponse {
    fn into_first_route(self) -> Option<DirectionsResponse> {
        let route = self.routes.into_iter().next()?;
        if route.geometry.coordinates.len() < 2 {
            return None;
        }

        tracing::debug!(
            distance_km = %format!("{:.2}", route.distance / 1000.0),
            duration_min = %format!("{:.0}", route.duration / 60.0),
            path_points = route.geometry.coordinates.len(),
            "Mapbox route: {:.2}km, {:.0}min",
            route.distance / 1000.0,
            route.duration / 60.0
        );

        Some(DirectionsResponse {
            distance_meters: route.distance,
            duration_seconds: route.duration,
            geometry: route.geometry.coordinates,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MapboxRoute {
    distance: f64, // meters
    duration: f64, // seconds
    geometry: MapboxGeometry,
}

#[derive(Debug, Deserialize)]
struct MapboxGeometry {
    coordinates: Vec<[f64; 2]>, // [lng, lat]
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectionsResponse {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// GeoJSON `[lng, lat]` pairs
    pub geometry: Vec<[f64; 2]>,
}

impl DirectionsResponse {
    /// Geometry as validated coordinates; out-of-range pairs are dropped
    pub fn to_coordinates(&self) -> Vec<Coordinates> {
        self.geometry
            .iter()
            .filter_map(|pair| Coordinates::from_lng_lat(*pair).ok())
            .collect()
    }
}
