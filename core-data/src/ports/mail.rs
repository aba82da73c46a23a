use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail provider rejected the message: {0}")]
    Rejected(String),

    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("mail delivery timed out after {0} ms")]
    Timeout(u64),
}

/// File attached by reference; the provider downloads it from `path`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub path: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[async_trait]
pub trait MailService: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Writes emails to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct LogMailService;

#[async_trait]
impl MailService for LogMailService {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            attachments = email.attachments.len(),
            "Mail delivery disabled, email logged"
        );
        Ok(())
    }
}

/// Keeps every email it is handed. Useful wherever delivery must be observed.
#[derive(Debug, Default)]
pub struct RecordingMailService {
    sent: Mutex<Vec<Email>>,
    fail: bool,
    delay: Option<Duration>,
}

impl RecordingMailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the attempt and then reports a transport failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Holds every send for `delay` before recording it.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MailService for RecordingMailService {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email);
        }
        if self.fail {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}
