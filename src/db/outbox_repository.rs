use crate::db::outbox_queries::{self, JobTable};
use crate::error::Result;
use crate::models::{
    EmailJob, FailureDisposition, NewEmailJob, NewEmergency, NewPushJob, PushDeliveryLog, PushJob,
    PushTokenRegistration,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

/// Durable storage behind the email/push outbox.
///
/// Enqueue is idempotent on the job's idempotency key. Claims move rows from
/// `queued` to `sending`; completion and failure only apply to rows still in
/// `sending`, so a sweeper that lost its lease cannot overwrite a newer claim.
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    async fn enqueue_email(&self, job: &NewEmailJob) -> Result<Option<Uuid>>;
    async fn enqueue_push(&self, job: &NewPushJob) -> Result<Option<Uuid>>;

    async fn claim_due_email_jobs(&self, limit: i64, lease: Duration) -> Result<Vec<EmailJob>>;
    async fn claim_due_push_jobs(&self, limit: i64, lease: Duration) -> Result<Vec<PushJob>>;

    async fn mark_email_sent(&self, id: Uuid, provider_message_id: Option<&str>) -> Result<bool>;
    async fn mark_email_failed(&self, id: Uuid, error: &str, disposition: FailureDisposition) -> Result<bool>;
    async fn mark_push_sent(&self, id: Uuid, ticket_id: Option<&str>) -> Result<bool>;
    async fn mark_push_failed(&self, id: Uuid, error: &str, disposition: FailureDisposition) -> Result<bool>;

    async fn log_push_delivery(&self, log: &PushDeliveryLog) -> Result<()>;
    async fn register_push_token(&self, registration: &PushTokenRegistration) -> Result<Uuid>;
    async fn deactivate_push_token(&self, token: &str) -> Result<()>;
    async fn active_push_tokens(&self) -> Result<Vec<String>>;
    async fn user_emails(&self) -> Result<Vec<String>>;
    async fn insert_emergency(&self, emergency: &NewEmergency) -> Result<Uuid>;
}

pub struct PgOutboxRepository {
    pool: PgPool,
}

impl PgOutboxRepository {
    pub fn new(pool: PgPool) -> Self {
        PgOutboxRepository { pool }
    }
}

#[async_trait]
impl OutboxRepository for PgOutboxRepository {
    async fn enqueue_email(&self, job: &NewEmailJob) -> Result<Option<Uuid>> {
        Ok(outbox_queries::enqueue_email_job(&self.pool, job).await?)
    }

    async fn enqueue_push(&self, job: &NewPushJob) -> Result<Option<Uuid>> {
        Ok(outbox_queries::enqueue_push_job(&self.pool, job).await?)
    }

    async fn claim_due_email_jobs(&self, limit: i64, lease: Duration) -> Result<Vec<EmailJob>> {
        Ok(outbox_queries::claim_due_email_jobs(&self.pool, limit, lease).await?)
    }

    async fn claim_due_push_jobs(&self, limit: i64, lease: Duration) -> Result<Vec<PushJob>> {
        Ok(outbox_queries::claim_due_push_jobs(&self.pool, limit, lease).await?)
    }

    async fn mark_email_sent(&self, id: Uuid, provider_message_id: Option<&str>) -> Result<bool> {
        Ok(outbox_queries::mark_job_sent(&self.pool, JobTable::Email, id, provider_message_id).await?)
    }

    async fn mark_email_failed(&self, id: Uuid, error: &str, disposition: FailureDisposition) -> Result<bool> {
        Ok(outbox_queries::mark_job_failed(&self.pool, JobTable::Email, id, error, disposition).await?)
    }

    async fn mark_push_sent(&self, id: Uuid, ticket_id: Option<&str>) -> Result<bool> {
        Ok(outbox_queries::mark_job_sent(&self.pool, JobTable::Push, id, ticket_id).await?)
    }

    async fn mark_push_failed(&self, id: Uuid, error: &str, disposition: FailureDisposition) -> Result<bool> {
        Ok(outbox_queries::mark_job_failed(&self.pool, JobTable::Push, id, error, disposition).await?)
    }

    async fn log_push_delivery(&self, log: &PushDeliveryLog) -> Result<()> {
        Ok(outbox_queries::insert_push_delivery_log(&self.pool, log).await?)
    }

    async fn register_push_token(&self, registration: &PushTokenRegistration) -> Result<Uuid> {
        Ok(outbox_queries::upsert_push_token(&self.pool, registration).await?)
    }

    async fn deactivate_push_token(&self, token: &str) -> Result<()> {
        Ok(outbox_queries::deactivate_push_token(&self.pool, token).await?)
    }

    async fn active_push_tokens(&self) -> Result<Vec<String>> {
        Ok(outbox_queries::active_push_tokens(&self.pool).await?)
    }

    async fn user_emails(&self) -> Result<Vec<String>> {
        Ok(outbox_queries::user_emails(&self.pool).await?)
    }

    async fn insert_emergency(&self, emergency: &NewEmergency) -> Result<Uuid> {
        Ok(outbox_queries::insert_emergency(&self.pool, emergency).await?)
    }
}
