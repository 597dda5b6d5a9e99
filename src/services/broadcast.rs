use crate::db::OutboxRepository;
use crate::error::{AppError, Result};
use crate::models::outbox::idempotency_key;
use crate::models::{
    BroadcastSummary, Channel, EmergencyBroadcastRequest, NewEmailJob, NewEmergency, NewPushJob,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Records an emergency and queues its email and push fan-out.
/// Delivery happens later in the dispatcher.
pub struct EmergencyBroadcaster {
    repo: Arc<dyn OutboxRepository>,
}

impl EmergencyBroadcaster {
    pub fn new(repo: Arc<dyn OutboxRepository>) -> Self {
        EmergencyBroadcaster { repo }
    }

    pub async fn broadcast(&self, request: &EmergencyBroadcastRequest) -> Result<BroadcastSummary> {
        request.validate().map_err(AppError::InvalidRequest)?;

        let emergency_id = self
            .repo
            .insert_emergency(&NewEmergency {
                title: request.title.trim().to_string(),
                message: request.message.trim().to_string(),
                location: request.location.clone(),
                created_by: request.created_by,
            })
            .await?;

        let email_jobs = if request.wants(Channel::Email) {
            self.enqueue_emails(emergency_id, request).await?
        } else {
            0
        };
        let push_jobs = if request.wants(Channel::Push) {
            self.enqueue_pushes(emergency_id, request).await?
        } else {
            0
        };

        tracing::info!(
            emergency_id = %emergency_id,
            email_jobs,
            push_jobs,
            "Emergency broadcast queued"
        );

        Ok(BroadcastSummary {
            success: true,
            emergency_id,
            email_jobs,
            push_jobs,
        })
    }

    async fn enqueue_emails(
        &self,
        emergency_id: Uuid,
        request: &EmergencyBroadcastRequest,
    ) -> Result<usize> {
        let recipients = match &request.recipients {
            Some(list) => list.clone(),
            None => self.repo.user_emails().await?,
        };
        let recipients: BTreeSet<String> = recipients
            .iter()
            .map(|r| r.trim().to_lowercase())
            .filter(|r| !r.is_empty())
            .collect();

        let subject = format!("[Emergency] {}", request.title.trim());
        let html = render_email_html(request);

        let mut queued = 0;
        for recipient in recipients {
            let job = NewEmailJob {
                emergency_id: Some(emergency_id),
                idempotency_key: idempotency_key(emergency_id, Channel::Email, &recipient),
                recipient,
                subject: subject.clone(),
                html: html.clone(),
            };
            if self.repo.enqueue_email(&job).await?.is_some() {
                queued += 1;
            }
        }
        Ok(queued)
    }

    async fn enqueue_pushes(
        &self,
        emergency_id: Uuid,
        request: &EmergencyBroadcastRequest,
    ) -> Result<usize> {
        let tokens: BTreeSet<String> = self.repo.active_push_tokens().await?.into_iter().collect();
        let data = serde_json::json!({
            "type": "emergency",
            "emergencyId": emergency_id,
            "location": request.location,
        });

        let mut queued = 0;
        for token in tokens {
            let job = NewPushJob {
                emergency_id: Some(emergency_id),
                idempotency_key: idempotency_key(emergency_id, Channel::Push, &token),
                token,
                title: request.title.trim().to_string(),
                body: request.message.trim().to_string(),
                data: data.clone(),
            };
            if self.repo.enqueue_push(&job).await?.is_some() {
                queued += 1;
            }
        }
        Ok(queued)
    }
}

fn render_email_html(request: &EmergencyBroadcastRequest) -> String {
    let location = request
        .location
        .as_deref()
        .map(|l| format!("<p><strong>Location:</strong> {}</p>", escape_html(l)))
        .unwrap_or_default();

    format!(
        "<h2>{}</h2><p>{}</p>{}",
        escape_html(request.title.trim()),
        escape_html(request.message.trim()).replace('\n', "<br>"),
        location
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
