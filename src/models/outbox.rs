use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle of an outbox row: `queued -> sending -> sent | failed`.
/// A failed attempt with retries left goes back to `queued`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Sending,
    Sent,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Sending => "sending",
            JobStatus::Sent => "sent",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Sent | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "sending" => Ok(JobStatus::Sending),
            "sent" => Ok(JobStatus::Sent),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

/// Broadcast delivery channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Push,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Email => f.write_str("email"),
            Channel::Push => f.write_str("push"),
        }
    }
}

/// Deduplication key shared by producers and the email provider:
/// one delivery per emergency, channel and recipient.
pub fn idempotency_key(emergency_id: Uuid, channel: Channel, recipient: &str) -> String {
    format!("{}:{}:{}", emergency_id, channel, recipient.trim().to_lowercase())
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEmailJob {
    pub emergency_id: Option<Uuid>,
    pub recipient: String,
    pub subject: String,
    pub html: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailJob {
    pub id: Uuid,
    pub emergency_id: Option<Uuid>,
    pub recipient: String,
    pub subject: String,
    pub html: String,
    pub status: JobStatus,
    /// Attempts started so far, including the current claim
    pub attempts: i32,
    pub idempotency_key: String,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPushJob {
    pub emergency_id: Option<Uuid>,
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PushJob {
    pub id: Uuid,
    pub emergency_id: Option<Uuid>,
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub status: JobStatus,
    pub attempts: i32,
    pub idempotency_key: String,
    pub last_error: Option<String>,
}

/// How a failed attempt is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Back to `queued`, not claimable before the given time
    RetryAt(OffsetDateTime),
    /// Terminal `failed`
    GiveUp,
}

/// One row of `push_delivery_logs`
#[derive(Debug, Clone, PartialEq)]
pub struct PushDeliveryLog {
    pub push_job_id: Uuid,
    pub token: String,
    pub status: JobStatus,
    pub ticket_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEmergency {
    pub title: String,
    pub message: String,
    pub location: Option<String>,
    pub created_by: Option<Uuid>,
}

/// Body of `POST /emergency`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyBroadcastRequest {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    /// Defaults to every channel
    #[serde(default)]
    pub channels: Option<Vec<Channel>>,
    /// Explicit email recipients; defaults to every user with an email
    #[serde(default)]
    pub recipients: Option<Vec<String>>,
}

impl EmergencyBroadcastRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.message.trim().is_empty() {
            return Err("message must not be empty".to_string());
        }
        if matches!(&self.channels, Some(c) if c.is_empty()) {
            return Err("channels must not be empty when given".to_string());
        }
        if let Some(recipients) = &self.recipients {
            if let Some(bad) = recipients.iter().find(|r| !looks_like_email(r)) {
                return Err(format!("Invalid recipient email: {}", bad));
            }
        }
        Ok(())
    }

    pub fn wants(&self, channel: Channel) -> bool {
        self.channels
            .as_ref()
            .map_or(true, |channels| channels.contains(&channel))
    }
}

fn looks_like_email(s: &str) -> bool {
    let s = s.trim();
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !s.contains(' '),
        None => false,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastSummary {
    pub success: bool,
    pub emergency_id: Uuid,
    pub email_jobs: usize,
    pub push_jobs: usize,
}

/// Body of `POST /push-tokens`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushTokenRegistration {
    pub token: String,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub platform: Option<String>,
}

impl PushTokenRegistration {
    pub fn validate(&self) -> Result<(), String> {
        let token = self.token.trim();
        if !(token.starts_with("ExponentPushToken[") || token.starts_with("ExpoPushToken["))
            || !token.ends_with(']')
        {
            return Err("token must be an Expo push token".to_string());
        }
        Ok(())
    }
}
