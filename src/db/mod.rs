use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

mod outbox_queries;
pub mod outbox_repository;
mod risk_queries;
pub mod risk_repository;

/// Query functions re-exported under `queries`
pub mod queries {
    pub use super::outbox_queries::*;
    pub use super::risk_queries::*;
}

pub use outbox_repository::{OutboxRepository, PgOutboxRepository};
pub use risk_queries::IncidentQuery;
pub use risk_repository::{PgRiskRepository, RiskRepository};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}
