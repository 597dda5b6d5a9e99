use crate::models::EmailJob;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const RESEND_EMAILS_URL: &str = "https://api.resend.com/emails";

/// Failure of one delivery attempt, as seen by the outbox
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeliveryError {
    /// Worth retrying later: timeouts, 429, 5xx
    #[error("transient delivery failure: {0}")]
    Transient(String),

    /// Retrying will not help: rejected payload, bad credentials
    #[error("permanent delivery failure: {0}")]
    Permanent(String),
}

impl DeliveryError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, DeliveryError::Permanent(_))
    }

    /// Classify a non-success provider response
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let message = format!("HTTP {}: {}", status, body);
        if status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::CONFLICT
            || status.is_server_error()
        {
            DeliveryError::Transient(message)
        } else {
            DeliveryError::Permanent(message)
        }
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver one queued email; returns the provider message id
    async fn send(&self, job: &EmailJob) -> Result<String, DeliveryError>;
}

/// Resend transactional email API
#[derive(Clone)]
pub struct ResendClient {
    client: Client,
    api_key: String,
    from: String,
    url: String,
}

impl ResendClient {
    pub fn new(api_key: String, from: String) -> Self {
        Self::with_url(api_key, from, RESEND_EMAILS_URL.to_string())
    }

    pub fn with_url(api_key: String, from: String, url: String) -> Self {
        ResendClient {
            client: Client::new(),
            api_key,
            from,
            url,
        }
    }
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct ResendResponse {
    id: String,
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, job: &EmailJob) -> Result<String, DeliveryError> {
        let body = ResendRequest {
            from: &self.from,
            to: [job.recipient.as_str()],
            subject: &job.subject,
            html: &job.html,
        };

        // Resend drops repeats of an idempotency key
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("Idempotency-Key", &job.idempotency_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transient(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = %status, job_id = %job.id, "Resend HTTP error {}: {}", status, text);
            return Err(DeliveryError::from_status(status, text));
        }

        let parsed: ResendResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Transient(format!("Failed to parse response: {}", e)))?;

        tracing::debug!(job_id = %job.id, message_id = %parsed.id, "Email accepted by Resend");
        Ok(parsed.id)
    }
}
