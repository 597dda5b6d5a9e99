use crate::db::risk_queries::{self, IncidentQuery};
use crate::error::Result;
use crate::models::CrimeIncident;
use async_trait::async_trait;
use sqlx::PgPool;

/// Source of located crime incidents for density lookups
#[async_trait]
pub trait RiskRepository: Send + Sync {
    async fn crimes_in_bbox(&self, query: &IncidentQuery) -> Result<Vec<CrimeIncident>>;

    /// Cheap liveness probe for health checks
    async fn ping(&self) -> Result<()>;
}

pub struct PgRiskRepository {
    pool: PgPool,
}

impl PgRiskRepository {
    pub fn new(pool: PgPool) -> Self {
        PgRiskRepository { pool }
    }
}

#[async_trait]
impl RiskRepository for PgRiskRepository {
    async fn crimes_in_bbox(&self, query: &IncidentQuery) -> Result<Vec<CrimeIncident>> {
        Ok(risk_queries::find_incidents(&self.pool, query).await?)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
