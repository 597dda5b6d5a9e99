use crate::AppState;
use axum::http::StatusCode;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /health
/// Database reachability and cache state
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let mut status = json!({
        "status": "ok",
        "checks": {}
    });

    match state.risk_repo.ping().await {
        Ok(()) => {
            status["checks"]["database"] = json!("ok");
        }
        Err(e) => {
            status["checks"]["database"] = json!({"error": e.to_string()});
            status["status"] = json!("error");
        }
    }

    let cache = state.facilities.cache();
    status["checks"]["cache"] = json!({
        "backend": cache.backend_name(),
        "healthy": cache.health_check().await,
        "stats": cache.get_stats().await,
    });

    let code = if status["status"] == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}
