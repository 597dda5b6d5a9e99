use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Mapbox API error: {0}")]
    MapboxApi(String),

    #[error("Overpass API error: {0}")]
    OverpassApi(String),

    #[error("Email provider error: {0}")]
    EmailProvider(String),

    #[error("Push provider error: {0}")]
    PushProvider(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

// Convert AppError into the `{ success: false, error }` envelope
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal database error")
            }
            AppError::MapboxApi(ref e) => {
                tracing::error!("Mapbox API error: {}", e);
                (StatusCode::BAD_GATEWAY, "Routing service error")
            }
            AppError::OverpassApi(ref e) => {
                tracing::error!("Overpass API error: {}", e);
                (StatusCode::BAD_GATEWAY, "Facility service error")
            }
            AppError::EmailProvider(ref e) => {
                tracing::error!("Email provider error: {}", e);
                (StatusCode::BAD_GATEWAY, "Email service error")
            }
            AppError::PushProvider(ref e) => {
                tracing::error!("Push provider error: {}", e);
                (StatusCode::BAD_GATEWAY, "Push service error")
            }
            AppError::Cache(ref e) => {
                tracing::warn!("Cache error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Cache error")
            }
            AppError::InvalidRequest(ref e) => (StatusCode::BAD_REQUEST, e.as_str()),
            AppError::NotFound(ref e) => (StatusCode::NOT_FOUND, e.as_str()),
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

// Extractor failures use the same envelope as handler errors
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
