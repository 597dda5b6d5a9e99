use crate::error::{AppError, Result};
use crate::models::{BroadcastSummary, EmergencyBroadcastRequest, PushTokenRegistration};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// POST /emergency
/// Queue an emergency broadcast; delivery is asynchronous
pub async fn broadcast_emergency(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<EmergencyBroadcastRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BroadcastSummary>)> {
    let Json(request) = payload?;
    let summary = state.broadcaster.broadcast(&request).await?;
    Ok((StatusCode::ACCEPTED, Json(summary)))
}

/// POST /push-tokens
/// Register a device token, reactivating it if it was switched off
pub async fn register_push_token(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<PushTokenRegistration>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(registration) = payload?;
    registration.validate().map_err(AppError::InvalidRequest)?;

    let id = state.outbox_repo.register_push_token(&registration).await?;
    tracing::info!(token_id = %id, "Push token registered");

    Ok(Json(json!({ "success": true, "id": id })))
}
