//! Outbox sweeper: claims due email and push jobs, hands them to the
//! providers and records the outcome.
//!
//! Delivery is at-least-once. A job whose sweeper dies mid-send stays in
//! `sending` until its lease expires and is then claimed again; the email
//! provider deduplicates on the job's idempotency key.

use crate::config::DispatcherConfig;
use crate::constants::{OUTBOX_EMAIL_CONCURRENCY, OUTBOX_RETRY_BASE_DELAY_SECONDS};
use crate::db::OutboxRepository;
use crate::error::Result;
use crate::models::{EmailJob, FailureDisposition, JobStatus, PushDeliveryLog, PushJob};
use crate::services::email::{DeliveryError, EmailSender};
use crate::services::push::{PushOutcome, PushSender};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::watch;

/// What one sweep did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub emails_sent: usize,
    pub emails_retried: usize,
    pub emails_failed: usize,
    pub push_sent: usize,
    pub push_retried: usize,
    pub push_failed: usize,
    pub tokens_deactivated: usize,
    /// Outcomes dropped because another sweeper had reclaimed the row
    pub lost_leases: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        *self == SweepReport::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recorded {
    Sent,
    Retried,
    Failed,
    LostLease,
}

/// Backoff for the next attempt, or give up once attempts run out.
/// `attempts` counts the attempt that just failed.
pub fn failure_disposition(
    attempts: i32,
    max_attempts: i32,
    permanent: bool,
    now: OffsetDateTime,
) -> FailureDisposition {
    if permanent || attempts >= max_attempts {
        return FailureDisposition::GiveUp;
    }
    let exponent = attempts.saturating_sub(1).clamp(0, 16) as u32;
    let delay = OUTBOX_RETRY_BASE_DELAY_SECONDS.saturating_mul(1_i64 << exponent);
    FailureDisposition::RetryAt(now + time::Duration::seconds(delay))
}

pub struct OutboxDispatcher {
    repo: Arc<dyn OutboxRepository>,
    email: Option<Arc<dyn EmailSender>>,
    push: Option<Arc<dyn PushSender>>,
    config: DispatcherConfig,
}

impl OutboxDispatcher {
    /// A missing sender leaves that channel's jobs queued
    pub fn new(
        repo: Arc<dyn OutboxRepository>,
        email: Option<Arc<dyn EmailSender>>,
        push: Option<Arc<dyn PushSender>>,
        config: DispatcherConfig,
    ) -> Self {
        OutboxDispatcher {
            repo,
            email,
            push,
            config,
        }
    }

    /// Claim and process one batch per channel. A storage error does not
    /// stop the rest of the sweep; the first one is returned at the end.
    pub async fn run_once(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let mut first_error = None;

        if let Some(sender) = &self.email {
            if let Err(e) = self.sweep_email(sender.as_ref(), &mut report).await {
                first_error.get_or_insert(e);
            }
        }
        if let Some(sender) = &self.push {
            if let Err(e) = self.sweep_push(sender.as_ref(), &mut report).await {
                first_error.get_or_insert(e);
            }
        }

        if !report.is_empty() {
            tracing::info!(
                emails_sent = report.emails_sent,
                emails_retried = report.emails_retried,
                emails_failed = report.emails_failed,
                push_sent = report.push_sent,
                push_retried = report.push_retried,
                push_failed = report.push_failed,
                tokens_deactivated = report.tokens_deactivated,
                lost_leases = report.lost_leases,
                failed = first_error.is_some(),
                "Outbox sweep complete"
            );
        }
        first_error.map_or(Ok(report), Err)
    }

    /// Sweep on an interval until `shutdown` flips to true
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.sweep_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.config.sweep_interval_secs,
            batch_size = self.config.batch_size,
            "Outbox dispatcher started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_once().await {
                        tracing::error!("Outbox sweep failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Outbox dispatcher stopped");
    }

    async fn sweep_email(&self, sender: &dyn EmailSender, report: &mut SweepReport) -> Result<()> {
        let jobs = self
            .repo
            .claim_due_email_jobs(self.config.batch_size, self.config.lease())
            .await?;
        if jobs.is_empty() {
            return Ok(());
        }
        tracing::debug!(claimed = jobs.len(), "Claimed email jobs");

        let results: Vec<Result<Recorded>> = stream::iter(jobs)
            .map(|job| self.deliver_email(sender, job))
            .buffer_unordered(OUTBOX_EMAIL_CONCURRENCY)
            .collect()
            .await;

        let mut first_error = None;
        for result in results {
            match result {
                Ok(Recorded::Sent) => report.emails_sent += 1,
                Ok(Recorded::Retried) => report.emails_retried += 1,
                Ok(Recorded::Failed) => report.emails_failed += 1,
                Ok(Recorded::LostLease) => report.lost_leases += 1,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn deliver_email(&self, sender: &dyn EmailSender, job: EmailJob) -> Result<Recorded> {
        match sender.send(&job).await {
            Ok(message_id) => {
                let owned = self.repo.mark_email_sent(job.id, Some(&message_id)).await?;
                Ok(if owned { Recorded::Sent } else { Recorded::LostLease })
            }
            Err(e) => {
                let disposition = failure_disposition(
                    job.attempts,
                    self.config.max_attempts,
                    e.is_permanent(),
                    OffsetDateTime::now_utc(),
                );
                tracing::warn!(
                    job_id = %job.id,
                    attempts = job.attempts,
                    "Email delivery failed: {}",
                    e
                );
                let owned = self
                    .repo
                    .mark_email_failed(job.id, &e.to_string(), disposition)
                    .await?;
                Ok(recorded_failure(owned, disposition))
            }
        }
    }

    async fn sweep_push(&self, sender: &dyn PushSender, report: &mut SweepReport) -> Result<()> {
        let jobs = self
            .repo
            .claim_due_push_jobs(self.config.batch_size, self.config.lease())
            .await?;
        if jobs.is_empty() {
            return Ok(());
        }
        tracing::debug!(claimed = jobs.len(), "Claimed push jobs");

        let outcomes = match sender.send_batch(&jobs).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::warn!(jobs = jobs.len(), "Push batch failed: {}", e);
                jobs.iter()
                    .map(|_| batch_failure_outcome(&e))
                    .collect()
            }
        };

        let mut first_error = None;
        for (job, outcome) in jobs.iter().zip(outcomes) {
            match self.record_push(job, outcome, report).await {
                Ok(Recorded::Sent) => report.push_sent += 1,
                Ok(Recorded::Retried) => report.push_retried += 1,
                Ok(Recorded::Failed) => report.push_failed += 1,
                Ok(Recorded::LostLease) => report.lost_leases += 1,
                Err(e) => {
                    tracing::error!(job_id = %job.id, "Failed to record push outcome: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn record_push(
        &self,
        job: &PushJob,
        outcome: PushOutcome,
        report: &mut SweepReport,
    ) -> Result<Recorded> {
        let (status, ticket_id, error, recorded) = match outcome {
            PushOutcome::Accepted { ticket_id } => {
                let owned = self.repo.mark_push_sent(job.id, ticket_id.as_deref()).await?;
                let recorded = if owned { Recorded::Sent } else { Recorded::LostLease };
                (JobStatus::Sent, ticket_id, None, recorded)
            }
            PushOutcome::DeviceNotRegistered(message) => {
                tracing::info!(job_id = %job.id, "Deactivating unregistered push token");
                self.repo.deactivate_push_token(&job.token).await?;
                report.tokens_deactivated += 1;
                let owned = self
                    .repo
                    .mark_push_failed(job.id, &message, FailureDisposition::GiveUp)
                    .await?;
                let recorded = recorded_failure(owned, FailureDisposition::GiveUp);
                (JobStatus::Failed, None, Some(message), recorded)
            }
            PushOutcome::Rejected { message, retryable } => {
                let disposition = failure_disposition(
                    job.attempts,
                    self.config.max_attempts,
                    !retryable,
                    OffsetDateTime::now_utc(),
                );
                tracing::warn!(job_id = %job.id, attempts = job.attempts, "Push rejected: {}", message);
                let owned = self.repo.mark_push_failed(job.id, &message, disposition).await?;
                let recorded = recorded_failure(owned, disposition);
                let status = match disposition {
                    FailureDisposition::RetryAt(_) => JobStatus::Queued,
                    FailureDisposition::GiveUp => JobStatus::Failed,
                };
                (status, None, Some(message), recorded)
            }
        };

        self.repo
            .log_push_delivery(&PushDeliveryLog {
                push_job_id: job.id,
                token: job.token.clone(),
                status,
                ticket_id,
                error,
            })
            .await?;

        Ok(recorded)
    }
}

fn batch_failure_outcome(error: &DeliveryError) -> PushOutcome {
    PushOutcome::Rejected {
        message: error.to_string(),
        retryable: !error.is_permanent(),
    }
}

fn recorded_failure(owned: bool, disposition: FailureDisposition) -> Recorded {
    match (owned, disposition) {
        (false, _) => Recorded::LostLease,
        (true, FailureDisposition::RetryAt(_)) => Recorded::Retried,
        (true, FailureDisposition::GiveUp) => Recorded::Failed,
    }
}
