use crate::models::{
    EmailJob, FailureDisposition, JobStatus, NewEmailJob, NewEmergency, NewPushJob,
    PushDeliveryLog, PushJob, PushTokenRegistration,
};
use sqlx::PgPool;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

/// The two outbox tables share their status columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTable {
    Email,
    Push,
}

impl JobTable {
    fn name(self) -> &'static str {
        match self {
            JobTable::Email => "email_jobs",
            JobTable::Push => "push_jobs",
        }
    }
}

/// Queue an email; `None` when the idempotency key was already queued
pub async fn enqueue_email_job(pool: &PgPool, job: &NewEmailJob) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO email_jobs (emergency_id, recipient, subject, html, idempotency_key)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (idempotency_key) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(job.emergency_id)
    .bind(&job.recipient)
    .bind(&job.subject)
    .bind(&job.html)
    .bind(&job.idempotency_key)
    .fetch_optional(pool)
    .await
}

/// Queue a push notification; `None` when the idempotency key was already queued
pub async fn enqueue_push_job(pool: &PgPool, job: &NewPushJob) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO push_jobs (emergency_id, token, title, body, data, idempotency_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (idempotency_key) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(job.emergency_id)
    .bind(&job.token)
    .bind(&job.title)
    .bind(&job.body)
    .bind(&job.data)
    .bind(&job.idempotency_key)
    .fetch_optional(pool)
    .await
}

/// Claim due email jobs: `queued` rows whose time has come, plus `sending`
/// rows whose lease expired. Each claim flips the row to `sending` and bumps
/// `attempts` in one statement; concurrent sweepers skip locked rows.
pub async fn claim_due_email_jobs(
    pool: &PgPool,
    limit: i64,
    lease: Duration,
) -> Result<Vec<EmailJob>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EmailJobRow>(
        r#"
        UPDATE email_jobs
        SET status = 'sending', attempts = attempts + 1, updated_at = now()
        WHERE id IN (
            SELECT id FROM email_jobs
            WHERE (status = 'queued' AND scheduled_at <= now())
               OR (status = 'sending' AND updated_at < now() - make_interval(secs => $2))
            ORDER BY scheduled_at
            LIMIT $1
            FOR UPDATE SKIP LOCKED
        )
        RETURNING id, emergency_id, recipient, subject, html, status, attempts,
                  idempotency_key, last_error
        "#,
    )
    .bind(limit)
    .bind(lease.as_secs_f64())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(EmailJobRow::into_job).collect())
}

/// Push counterpart of [`claim_due_email_jobs`]
pub async fn claim_due_push_jobs(
    pool: &PgPool,
    limit: i64,
    lease: Duration,
) -> Result<Vec<PushJob>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PushJobRow>(
        r#"
        UPDATE push_jobs
        SET status = 'sending', attempts = attempts + 1, updated_at = now()
        WHERE id IN (
            SELECT id FROM push_jobs
            WHERE (status = 'queued' AND scheduled_at <= now())
               OR (status = 'sending' AND updated_at < now() - make_interval(secs => $2))
            ORDER BY scheduled_at
            LIMIT $1
            FOR UPDATE SKIP LOCKED
        )
        RETURNING id, emergency_id, token, title, body, data, status, attempts,
                  idempotency_key, last_error
        "#,
    )
    .bind(limit)
    .bind(lease.as_secs_f64())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PushJobRow::into_job).collect())
}

/// `sending -> sent`. Returns false when the row was no longer ours.
pub async fn mark_job_sent(
    pool: &PgPool,
    table: JobTable,
    id: Uuid,
    provider_message_id: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE {}
        SET status = 'sent', sent_at = now(), updated_at = now(),
            provider_message_id = $2, last_error = NULL
        WHERE id = $1 AND status = 'sending'
        "#,
        table.name()
    );

    let result = sqlx::query(&sql)
        .bind(id)
        .bind(provider_message_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// `sending -> queued` (retry later) or `sending -> failed`.
/// Returns false when the row was no longer ours.
pub async fn mark_job_failed(
    pool: &PgPool,
    table: JobTable,
    id: Uuid,
    error: &str,
    disposition: FailureDisposition,
) -> Result<bool, sqlx::Error> {
    let retry_at: Option<OffsetDateTime> = match disposition {
        FailureDisposition::RetryAt(at) => Some(at),
        FailureDisposition::GiveUp => None,
    };

    let sql = format!(
        r#"
        UPDATE {}
        SET status = CASE WHEN $3::timestamptz IS NULL THEN 'failed' ELSE 'queued' END,
            scheduled_at = COALESCE($3, scheduled_at),
            last_error = $2,
            updated_at = now()
        WHERE id = $1 AND status = 'sending'
        "#,
        table.name()
    );

    let result = sqlx::query(&sql)
        .bind(id)
        .bind(error)
        .bind(retry_at)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Row counts per status for one outbox table
pub async fn count_jobs_by_status(
    pool: &PgPool,
    table: JobTable,
) -> Result<Vec<(String, i64)>, sqlx::Error> {
    let sql = format!(
        "SELECT status, COUNT(*) FROM {} GROUP BY status ORDER BY status",
        table.name()
    );
    sqlx::query_as::<_, (String, i64)>(&sql).fetch_all(pool).await
}

pub async fn insert_push_delivery_log(pool: &PgPool, log: &PushDeliveryLog) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO push_delivery_logs (push_job_id, token, status, ticket_id, error)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(log.push_job_id)
    .bind(&log.token)
    .bind(log.status.as_str())
    .bind(&log.ticket_id)
    .bind(&log.error)
    .execute(pool)
    .await?;
    Ok(())
}

/// Register a device token, reactivating it if it was switched off
pub async fn upsert_push_token(pool: &PgPool, registration: &PushTokenRegistration) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO push_tokens (token, user_id, platform, is_active)
        VALUES ($1, $2, $3, TRUE)
        ON CONFLICT (token) DO UPDATE
        SET is_active = TRUE,
            user_id = COALESCE(EXCLUDED.user_id, push_tokens.user_id),
            platform = COALESCE(EXCLUDED.platform, push_tokens.platform),
            updated_at = now()
        RETURNING id
        "#,
    )
    .bind(registration.token.trim())
    .bind(registration.user_id)
    .bind(&registration.platform)
    .fetch_one(pool)
    .await
}

pub async fn deactivate_push_token(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE push_tokens SET is_active = FALSE, updated_at = now() WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn active_push_tokens(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT token FROM push_tokens WHERE is_active ORDER BY created_at")
        .fetch_all(pool)
        .await
}

pub async fn user_emails(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT DISTINCT lower(email) FROM users WHERE email IS NOT NULL AND email <> '' ORDER BY 1",
    )
    .fetch_all(pool)
    .await
}

pub async fn insert_emergency(pool: &PgPool, emergency: &NewEmergency) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO emergency (title, message, location, created_by)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(&emergency.title)
    .bind(&emergency.message)
    .bind(&emergency.location)
    .bind(emergency.created_by)
    .fetch_one(pool)
    .await
}

fn parse_status(raw: &str, id: Uuid) -> JobStatus {
    raw.parse().unwrap_or_else(|e| {
        tracing::warn!("Job {} has unknown status: {}. Treating as sending.", id, e);
        JobStatus::Sending
    })
}

#[derive(sqlx::FromRow)]
struct EmailJobRow {
    id: Uuid,
    emergency_id: Option<Uuid>,
    recipient: String,
    subject: String,
    html: String,
    status: String,
    attempts: i32,
    idempotency_key: String,
    last_error: Option<String>,
}

impl EmailJobRow {
    fn into_job(self) -> EmailJob {
        EmailJob {
            status: parse_status(&self.status, self.id),
            id: self.id,
            emergency_id: self.emergency_id,
            recipient: self.recipient,
            subject: self.subject,
            html: self.html,
            attempts: self.attempts,
            idempotency_key: self.idempotency_key,
            last_error: self.last_error,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PushJobRow {
    id: Uuid,
    emergency_id: Option<Uuid>,
    token: String,
    title: String,
    body: String,
    data: serde_json::Value,
    status: String,
    attempts: i32,
    idempotency_key: String,
    last_error: Option<String>,
}

impl PushJobRow {
    fn into_job(self) -> PushJob {
        PushJob {
            status: parse_status(&self.status, self.id),
            id: self.id,
            emergency_id: self.emergency_id,
            token: self.token,
            title: self.title,
            body: self.body,
            data: self.data,
            attempts: self.attempts,
            idempotency_key: self.idempotency_key,
            last_error: self.last_error,
        }
    }
}
