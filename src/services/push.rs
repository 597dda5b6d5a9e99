use crate::constants::EXPO_MAX_MESSAGES_PER_REQUEST;
use crate::models::PushJob;
use crate::services::email::DeliveryError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

/// Per-message result of a push send, in request order
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    Accepted { ticket_id: Option<String> },
    /// The device token is dead and should stop receiving pushes
    DeviceNotRegistered(String),
    Rejected { message: String, retryable: bool },
}

#[async_trait]
pub trait PushSender: Send + Sync {
    /// Send the jobs' messages; one outcome per job, same order.
    /// `Err` means nothing in the batch is known to have been accepted;
    /// a partly delivered batch comes back `Ok` with the failed messages
    /// as `Rejected`.
    async fn send_batch(&self, jobs: &[PushJob]) -> Result<Vec<PushOutcome>, DeliveryError>;
}

/// Expo push notification service
#[derive(Clone)]
pub struct ExpoPushClient {
    client: Client,
    access_token: Option<String>,
    url: String,
}

impl ExpoPushClient {
    pub fn new(access_token: Option<String>) -> Self {
        Self::with_url(access_token, EXPO_PUSH_URL.to_string())
    }

    pub fn with_url(access_token: Option<String>, url: String) -> Self {
        ExpoPushClient {
            client: Client::new(),
            access_token,
            url,
        }
    }

    async fn send_chunk(&self, jobs: &[PushJob]) -> Result<Vec<PushOutcome>, DeliveryError> {
        let messages: Vec<ExpoMessage> = jobs.iter().map(ExpoMessage::from_job).collect();

        let mut request = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(&messages);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::Transient(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = %status, messages = jobs.len(), "Expo HTTP error {}: {}", status, text);
            return Err(DeliveryError::from_status(status, text));
        }

        let parsed: ExpoResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Transient(format!("Failed to parse response: {}", e)))?;

        Ok(tickets_to_outcomes(parsed.data, jobs.len()))
    }
}

#[async_trait]
impl PushSender for ExpoPushClient {
    async fn send_batch(&self, jobs: &[PushJob]) -> Result<Vec<PushOutcome>, DeliveryError> {
        let mut outcomes = Vec::with_capacity(jobs.len());
        let mut delivered_chunks = 0;
        let mut first_error = None;

        // A failed chunk only fails its own messages
        for chunk in jobs.chunks(EXPO_MAX_MESSAGES_PER_REQUEST) {
            match self.send_chunk(chunk).await {
                Ok(chunk_outcomes) => {
                    delivered_chunks += 1;
                    outcomes.extend(chunk_outcomes);
                }
                Err(e) => {
                    outcomes.extend(chunk.iter().map(|_| PushOutcome::Rejected {
                        message: e.to_string(),
                        retryable: !e.is_permanent(),
                    }));
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if delivered_chunks == 0 => Err(e),
            _ => Ok(outcomes),
        }
    }
}

#[derive(Serialize)]
struct ExpoMessage<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
    data: &'a serde_json::Value,
    sound: &'static str,
    priority: &'static str,
}

impl<'a> ExpoMessage<'a> {
    fn from_job(job: &'a PushJob) -> Self {
        ExpoMessage {
            to: &job.token,
            title: &job.title,
            body: &job.body,
            data: &job.data,
            sound: "default",
            priority: "high",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExpoResponse {
    #[serde(default)]
    data: Vec<ExpoTicket>,
}

#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: String,
    id: Option<String>,
    message: Option<String>,
    details: Option<ExpoTicketDetails>,
}

#[derive(Debug, Deserialize)]
struct ExpoTicketDetails {
    error: Option<String>,
}

fn tickets_to_outcomes(tickets: Vec<ExpoTicket>, expected: usize) -> Vec<PushOutcome> {
    let mut outcomes: Vec<PushOutcome> = tickets
        .into_iter()
        .take(expected)
        .map(|ticket| {
            if ticket.status == "ok" {
                return PushOutcome::Accepted { ticket_id: ticket.id };
            }

            let code = ticket.details.and_then(|d| d.error);
            let message = ticket
                .message
                .or_else(|| code.clone())
                .unwrap_or_else(|| "Unknown Expo error".to_string());

            match code.as_deref() {
                Some("DeviceNotRegistered") => PushOutcome::DeviceNotRegistered(message),
                Some("MessageRateExceeded") => PushOutcome::Rejected {
                    message,
                    retryable: true,
                },
                _ => PushOutcome::Rejected {
                    message,
                    retryable: false,
                },
            }
        })
        .collect();

    // Missing tickets leave the message's fate unknown
    while outcomes.len() < expected {
        outcomes.push(PushOutcome::Rejected {
            message: "No ticket returned".to_string(),
            retryable: true,
        });
    }
    outcomes
}
