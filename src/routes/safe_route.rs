use crate::error::{AppError, Result};
use crate::models::{SafeRouteRequest, SafeRouteResponse};
use crate::services::sampler::sample_line;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use std::sync::Arc;

/// POST /routes/safe
/// Route origin to destination, then assess samples along the polyline
pub async fn create_safe_route(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SafeRouteRequest>, JsonRejection>,
) -> Result<Json<SafeRouteResponse>> {
    let Json(request) = payload?;
    let (origin, destination) = request.validate().map_err(AppError::InvalidRequest)?;

    tracing::info!(
        origin_lat = origin.lat,
        origin_lng = origin.lng,
        destination_lat = destination.lat,
        destination_lng = destination.lng,
        mode = %request.mode,
        "Safe route request"
    );

    let directions = state
        .directions
        .get_directions(&[origin, destination], request.mode)
        .await?;

    let path = directions.to_coordinates();
    let risk = state.route_safety.config();
    let samples = sample_line(&path, risk.sample_interval_m, risk.max_samples);

    let report = state
        .route_safety
        .assess_route(
            &samples,
            &request.filters.clone().unwrap_or_default(),
            &request.time.unwrap_or_default(),
            Some(directions.distance_meters),
            Some(directions.duration_seconds),
        )
        .await?;

    Ok(Json(SafeRouteResponse {
        success: true,
        origin: request.origin,
        destination: request.destination,
        mode: request.mode,
        geometry: directions.geometry,
        samples: samples.iter().map(|c| c.to_lng_lat()).collect(),
        report,
    }))
}
