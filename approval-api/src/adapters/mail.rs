use std::time::Duration;

use async_trait::async_trait;
use core_data::ports::mail::{Attachment, Email, MailError, MailService};
use serde::Serialize;
use tracing::{debug, instrument};

#[derive(Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    attachments: &'a [Attachment],
}

/// Delivers through a transactional-email HTTP API that accepts
/// `{from, to, subject, html, attachments}` JSON with bearer auth.
pub struct HttpMailService {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailService {
    pub fn new(endpoint: String, api_key: Option<String>, from: String, timeout: Duration) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MailError::Transport(format!("HTTP client creation error: {}", e)))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl MailService for HttpMailService {
    #[instrument(skip(self, email), fields(to = %email.to))]
    async fn send(&self, email: Email) -> Result<(), MailError> {
        let body = OutgoingEmail {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            attachments: &email.attachments,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MailError::Transport(format!("mail API timed out: {}", e))
            } else {
                MailError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected(format!("{}: {}", status, detail)));
        }
        debug!(status = %status, "Mail API accepted the message");
        Ok(())
    }
}
