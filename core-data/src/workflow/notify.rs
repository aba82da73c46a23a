use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};

use crate::models::record::WorkflowRecord;
use crate::models::role::Role;
use crate::ports::mail::{Attachment, Email, MailError, MailService};

pub const DEFAULT_MAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// Hands emails to the mail service on detached tasks so a slow or failing
/// provider never holds up the caller.
#[derive(Clone)]
pub struct Notifier {
    mail: Arc<dyn MailService>,
    timeout: Duration,
}

/// An email that has been handed off for delivery.
#[derive(Debug)]
pub struct Dispatch {
    pub recipient: String,
    pub subject: String,
    handle: JoinHandle<Result<(), MailError>>,
}

impl Dispatch {
    /// Waits for the background delivery to finish.
    pub async fn wait(self) -> Result<(), MailError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(MailError::Transport(format!("delivery task failed: {}", e))),
        }
    }
}

impl Notifier {
    pub fn new(mail: Arc<dyn MailService>, timeout: Duration) -> Self {
        Self { mail, timeout }
    }

    pub fn dispatch(&self, email: Email) -> Dispatch {
        let mail = Arc::clone(&self.mail);
        let timeout = self.timeout;
        let recipient = email.to.clone();
        let subject = email.subject.clone();
        let span = tracing::info_span!("mail_delivery", to = %recipient);

        let handle = tokio::spawn(
            async move {
                let start = Instant::now();
                let result = match tokio::time::timeout(timeout, mail.send(email)).await {
                    Ok(result) => result,
                    Err(_) => Err(MailError::Timeout(timeout.as_millis() as u64)),
                };
                match &result {
                    Ok(()) => info!(
                        duration_ms = start.elapsed().as_millis(),
                        "Notification delivered"
                    ),
                    Err(MailError::Timeout(ms)) => warn!(timeout_ms = ms, "Notification timed out"),
                    Err(e) => error!(error = %e, "Notification delivery failed"),
                }
                result
            }
            .instrument(span),
        );

        Dispatch {
            recipient,
            subject,
            handle,
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
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

fn attachments(record: &WorkflowRecord) -> Vec<Attachment> {
    record
        .documento()
        .map(|url| {
            vec![Attachment {
                filename: "estructura_organizacional".to_string(),
                path: url.to_string(),
            }]
        })
        .unwrap_or_default()
}

fn summary(record: &WorkflowRecord) -> String {
    let perfil = record.perfil();
    let mut rows = vec![
        ("Cargo", perfil.nombre_cargo.as_str()),
        ("Misión", perfil.mision_cargo.as_str()),
        ("Empresa", record.company().as_str()),
    ];
    if let Some(area) = perfil.area_general.as_deref() {
        rows.push(("Área", area));
    }
    if let Some(proceso) = perfil.proceso.as_deref() {
        rows.push(("Proceso", proceso));
    }
    let rows: String = rows
        .into_iter()
        .map(|(label, value)| format!("<tr><th>{}</th><td>{}</td></tr>", label, escape_html(value)))
        .collect();
    format!(
        "<table>{}<tr><th>Solicitud</th><td>{}</td></tr></table>",
        rows,
        record.id()
    )
}

/// Asks `role` to review the profile.
pub fn approval_request(record: &WorkflowRecord, role: Role, recipient: &str) -> Email {
    let cargo = &record.perfil().nombre_cargo;
    Email {
        to: recipient.to_string(),
        subject: format!("Solicitud de aprobación de perfil: {} ({})", cargo, role.label()),
        html: format!(
            "<p>Hay un perfil de cargo pendiente de su aprobación como {}.</p>{}<p>Estado: {}</p>",
            escape_html(role.label()),
            summary(record),
            escape_html(&record.estado().to_string())
        ),
        attachments: attachments(record),
    }
}

/// Tells the creator that every role approved.
pub fn final_approval(record: &WorkflowRecord, recipient: &str) -> Email {
    Email {
        to: recipient.to_string(),
        subject: format!("Perfil aprobado: {}", record.perfil().nombre_cargo),
        html: format!(
            "<p>El perfil de cargo fue aprobado por todas las instancias.</p>{}",
            summary(record)
        ),
        attachments: attachments(record),
    }
}

/// Tells the creator who rejected the profile and why.
pub fn rejection_notice(
    record: &WorkflowRecord,
    role: Role,
    approver: &str,
    comment: &str,
    recipient: &str,
) -> Email {
    Email {
        to: recipient.to_string(),
        subject: format!("Perfil rechazado: {}", record.perfil().nombre_cargo),
        html: format!(
            "<p>El perfil de cargo fue rechazado por {} ({}).</p><p>Observación: {}</p>{}",
            escape_html(role.label()),
            escape_html(approver),
            escape_html(comment),
            summary(record)
        ),
        attachments: attachments(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_is_escaped() {
        assert_eq!(escape_html("<b>R&D</b>"), "&lt;b&gt;R&amp;D&lt;/b&gt;");
    }
}
