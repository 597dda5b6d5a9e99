pub mod emergency;
pub mod facilities;
pub mod geocoding;
pub mod health;
pub mod jobs;
pub mod risk_assessment;
pub mod route_assessment;
pub mod safe_route;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/bigquery/route-assessment",
            post(route_assessment::assess_route),
        )
        .route(
            "/bigquery/risk-assessment",
            get(risk_assessment::assess_point),
        )
        .route("/facilities", get(facilities::list_facilities))
        .route("/routes/safe", post(safe_route::create_safe_route))
        .route("/geocode/reverse", get(geocoding::reverse_geocode))
        .route("/places/search", get(geocoding::search_places))
        .route("/emergency", post(emergency::broadcast_emergency))
        .route("/push-tokens", post(emergency::register_push_token))
        .route("/jobs/process", post(jobs::process_jobs))
        .route("/health", get(health::health_check))
        .with_state(state)
}

/// Full application: API under `/api`, CORS and request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
