use crate::error::{AppError, Result};
use crate::models::{RouteAssessmentRequest, RouteAssessmentResponse};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use std::sync::Arc;

/// POST /bigquery/route-assessment
/// Assess the given `[lng, lat]` samples in order
pub async fn assess_route(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RouteAssessmentRequest>, JsonRejection>,
) -> Result<Json<RouteAssessmentResponse>> {
    let Json(request) = payload?;
    let coords = request.validate().map_err(AppError::InvalidRequest)?;

    tracing::info!(points = coords.len(), "Route assessment request");

    let report = state
        .route_safety
        .assess_route(
            &coords,
            &request.filters.unwrap_or_default(),
            &request.time.unwrap_or_default(),
            None,
            None,
        )
        .await?;

    Ok(Json(RouteAssessmentResponse {
        success: true,
        report,
    }))
}
