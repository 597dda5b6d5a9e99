use crate::error::{AppError, Result};
use crate::models::Coordinates;
use crate::services::Place;
use crate::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PlaceResponse {
    pub success: bool,
    pub data: Option<Place>,
}

#[derive(Debug, Serialize)]
pub struct PlacesResponse {
    pub success: bool,
    pub data: Vec<Place>,
}

/// GET /geocode/reverse?lat&lng
pub async fn reverse_geocode(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<ReverseQuery>, QueryRejection>,
) -> Result<Json<PlaceResponse>> {
    let Query(query) = query?;
    let point = Coordinates::new(query.lat, query.lng).map_err(AppError::InvalidRequest)?;

    let place = state.geocoder.reverse(point).await?;
    Ok(Json(PlaceResponse {
        success: true,
        data: place,
    }))
}

/// GET /places/search?q&lat&lng
pub async fn search_places(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<PlacesResponse>> {
    let Query(query) = query?;
    let proximity = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng).map_err(AppError::InvalidRequest)?),
        (None, None) => None,
        _ => {
            return Err(AppError::InvalidRequest(
                "lat and lng must be given together".to_string(),
            ))
        }
    };

    let places = state.geocoder.search(&query.q, proximity).await?;
    Ok(Json(PlacesResponse {
        success: true,
        data: places,
    }))
}
