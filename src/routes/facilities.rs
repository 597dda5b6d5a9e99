use crate::error::Result;
use crate::models::FacilitiesResponse;
use crate::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// GET /facilities
/// Police stations, hospitals, clinics and fire stations in the municipality
pub async fn list_facilities(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FacilitiesResponse>> {
    Ok(Json(state.facilities.get().await?))
}
