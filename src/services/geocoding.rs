use crate::error::{AppError, Result};
use crate::models::Coordinates;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const MAPBOX_GEOCODING_BASE_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";
const SEARCH_RESULT_LIMIT: &str = "5";
const SEARCH_COUNTRY: &str = "ph";

/// A named place returned by reverse geocoding or search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    pub full_address: String,
    pub coordinates: Coordinates,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Closest address to a point, if any
    async fn reverse(&self, point: Coordinates) -> Result<Option<Place>>;

    /// Free-text place search, biased towards `proximity` when given
    async fn search(&self, query: &str, proximity: Option<Coordinates>) -> Result<Vec<Place>>;
}

#[derive(Clone)]
pub struct GeocodingClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeocodingClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, MAPBOX_GEOCODING_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        GeocodingClient {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<Place>> {
        let url = format!("{}/{}.json", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(&[("access_token", &self.api_key)])
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::MapboxApi(format!("Geocoding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = %status, "Mapbox geocoding HTTP error {}: {}", status, error_text);
            return Err(AppError::MapboxApi(format!("HTTP {}: {}", status, error_text)));
        }

        let body: GeocodingApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::MapboxApi(format!("Failed to parse geocoding response: {}", e)))?;

        Ok(body.into_places())
    }
}

#[async_trait]
impl Geocoder for GeocodingClient {
    async fn reverse(&self, point: Coordinates) -> Result<Option<Place>> {
        let path = format!("{},{}", point.lng, point.lat);
        let places = self.fetch(&path, &[("limit", "1".to_string())]).await?;

        tracing::debug!(lat = point.lat, lng = point.lng, found = !places.is_empty(), "Reverse geocode");
        Ok(places.into_iter().next())
    }

    async fn search(&self, query: &str, proximity: Option<Coordinates>) -> Result<Vec<Place>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidRequest("Search query is empty".to_string()));
        }

        let mut params = vec![
            ("limit", SEARCH_RESULT_LIMIT.to_string()),
            ("country", SEARCH_COUNTRY.to_string()),
            ("autocomplete", "true".to_string()),
        ];
        if let Some(p) = proximity {
            params.push(("proximity", format!("{},{}", p.lng, p.lat)));
        }

        let places = self.fetch(&urlencoding::encode(query), &params).await?;
        tracing::debug!(query = %query, results = places.len(), "Place search");
        Ok(places)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingApiResponse {
    #[serde(default)]
    features: Vec<GeocodingFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodingFeature {
    id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    place_name: String,
    center: [f64; 2], // [lng, lat]
}

impl GeocodingApiResponse {
    fn into_places(self) -> Vec<Place> {
        self.features
            .into_iter()
            .filter_map(|f| {
                let coordinates = Coordinates::from_lng_lat(f.center).ok()?;
                let name = if f.text.is_empty() {
                    f.place_name.clone()
                } else {
                    f.text
                };
                Some(Place {
                    id: f.id,
                    name,
                    full_address: f.place_name,
                    coordinates,
                })
            })
            .collect()
    }
}
