use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::{BoundingBox, Coordinates, Facility, FacilityKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Overpass mirrors, tried round-robin
const OVERPASS_ENDPOINTS: &[&str] = &[
    "https://overpass-api.de/api/interpreter",
    "https://overpass.private.coffee/api/interpreter",
    "https://maps.mail.ru/osm/tools/overpass/api/interpreter",
];

/// Upstream of the facility list
#[async_trait]
pub trait FacilitySource: Send + Sync {
    async fn fetch_facilities(&self, bounds: &BoundingBox) -> Result<Vec<Facility>>;
}

#[derive(Clone)]
pub struct OverpassClient {
    client: Client,
    endpoints: Vec<String>,
    next_endpoint: Arc<AtomicUsize>,
    max_retries: usize,
}

impl Default for OverpassClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OverpassClient {
    pub fn new() -> Self {
        Self::with_endpoints(OVERPASS_ENDPOINTS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_endpoints(endpoints: Vec<String>) -> Self {
        OverpassClient {
            client: Client::new(),
            endpoints,
            next_endpoint: Arc::new(AtomicUsize::new(0)),
            max_retries: OVERPASS_MAX_RETRIES,
        }
    }

    fn endpoint(&self) -> Option<&str> {
        if self.endpoints.is_empty() {
            return None;
        }
        let idx = self.next_endpoint.fetch_add(1, Ordering::Relaxed);
        Some(&self.endpoints[idx % self.endpoints.len()])
    }

    /// Overpass QL for every facility kind inside the bounds
    fn build_query(bounds: &BoundingBox) -> String {
        let bbox = format!(
            "{},{},{},{}",
            bounds.min_lat, bounds.min_lng, bounds.max_lat, bounds.max_lng
        );

        let mut query = format!("[out:json][timeout:{}];(", OVERPASS_QUERY_TIMEOUT_SECONDS);
        for kind in FacilityKind::ALL {
            query.push_str(&format!(r#"nwr["amenity"="{}"]({});"#, kind.osm_amenity(), bbox));
        }
        query.push_str(");out center tags;");
        query
    }

    /// POST the query, rotating mirrors and backing off on timeouts,
    /// 429 and 504
    async fn execute_with_retry(&self, query: &str) -> Result<OverpassResponse> {
        let mut attempt = 0;

        loop {
            let endpoint = self
                .endpoint()
                .ok_or_else(|| AppError::OverpassApi("No Overpass endpoints configured".to_string()))?
                .to_string();

            let result = self
                .client
                .post(&endpoint)
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(format!("data={}", urlencoding::encode(query)))
                .timeout(Duration::from_secs(OVERPASS_HTTP_TIMEOUT_SECONDS))
                .send()
                .await;

            let error = match result {
                Ok(response) if response.status().is_success() => {
                    return response.json().await.map_err(|e| {
                        AppError::OverpassApi(format!("Failed to parse response: {}", e))
                    });
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    let retryable = status == OVERPASS_HTTP_TOO_MANY_REQUESTS
                        || status == OVERPASS_HTTP_GATEWAY_TIMEOUT;
                    if !retryable {
                        return Err(AppError::OverpassApi(format!("HTTP {}: {}", status, text)));
                    }
                    format!("HTTP {}", status)
                }
                Err(e) if e.is_timeout() => "Request timed out".to_string(),
                Err(e) => format!("Request failed: {}", e),
            };

            if attempt >= self.max_retries {
                return Err(AppError::OverpassApi(format!(
                    "{} after {} attempts",
                    error,
                    attempt + 1
                )));
            }

            attempt += 1;
            let backoff_ms = 1000 * 2_u64.pow(attempt as u32);
            tracing::warn!(
                endpoint = %endpoint,
                attempt,
                "Overpass {}, retrying in {}ms",
                error,
                backoff_ms
            );
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
    }
}

#[async_trait]
impl FacilitySource for OverpassClient {
    async fn fetch_facilities(&self, bounds: &BoundingBox) -> Result<Vec<Facility>> {
        let query = Self::build_query(bounds);
        tracing::debug!("Overpass facilities query: {}", query);

        let response = self.execute_with_retry(&query).await?;
        let facilities = elements_to_facilities(response.elements);

        tracing::info!(count = facilities.len(), "Fetched {} facilities from Overpass", facilities.len());
        Ok(facilities)
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    /// Present on ways and relations with `out center`
    center: Option<OverpassCenter>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

fn elements_to_facilities(elements: Vec<OverpassElement>) -> Vec<Facility> {
    let mut seen = HashSet::new();

    elements
        .into_iter()
        .filter_map(|el| {
            let kind = el
                .tags
                .get("amenity")
                .and_then(|a| FacilityKind::from_osm_amenity(a))?;

            let (lat, lng) = match (&el.center, el.lat, el.lon) {
                (Some(c), _, _) => (c.lat, c.lon),
                (None, Some(lat), Some(lon)) => (lat, lon),
                _ => return None,
            };
            let coordinates = Coordinates::new(lat, lng).ok()?;

            if !seen.insert(el.id) {
                return None;
            }

            let name = el
                .tags
                .get("name")
                .cloned()
                .unwrap_or_else(|| default_name(kind).to_string());

            Some(Facility {
                osm_id: el.id,
                name,
                kind,
                coordinates,
                address: address_from_tags(&el.tags),
                phone: el
                    .tags
                    .get("phone")
                    .or_else(|| el.tags.get("contact:phone"))
                    .cloned(),
            })
        })
        .collect()
}

fn default_name(kind: FacilityKind) -> &'static str {
    match kind {
        FacilityKind::PoliceStation => "Police Station",
        FacilityKind::Hospital => "Hospital",
        FacilityKind::Clinic => "Clinic",
        FacilityKind::FireStation => "Fire Station",
    }
}

fn address_from_tags(tags: &HashMap<String, String>) -> Option<String> {
    if let Some(full) = tags.get("addr:full") {
        return Some(full.clone());
    }

    let parts: Vec<&str> = ["addr:housenumber", "addr:street", "addr:city"]
        .iter()
        .filter_map(|k| tags.get(*k).map(String::as_str))
        .collect();

    (!parts.is_empty()).then(|| parts.join(" "))
}
