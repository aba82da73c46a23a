use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::models::auditlog::{AuditAction, AuditLog, ChangeLog};
use crate::models::errors::WorkflowError;
use crate::models::event::{EventKind, WorkflowEvent};
use crate::models::profile::{Submission, UploadedFile};
use crate::models::record::{Observations, WorkflowRecord};
use crate::models::state::WorkflowState;
use crate::ports::blob::BlobStore;
use crate::ports::events::EventPublisher;
use crate::ports::store::RecordStore;

use super::ids::IdGenerator;
use super::notify::{self, Dispatch, Notifier};
use super::validation::Validator;

#[derive(Debug)]
pub struct SubmissionOutcome {
    pub record: WorkflowRecord,
    pub notification: Dispatch,
}

/// Creates records and restarts them on resubmission.
#[derive(Clone)]
pub struct SubmissionHandler {
    store: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    notifier: Notifier,
    events: Arc<dyn EventPublisher>,
    ids: IdGenerator,
    validator: Validator,
}

impl SubmissionHandler {
    pub fn new(
        store: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Notifier,
        events: Arc<dyn EventPublisher>,
        ids: IdGenerator,
        validator: Validator,
    ) -> Self {
        Self {
            store,
            blobs,
            notifier,
            events,
            ids,
            validator,
        }
    }

    #[instrument(skip(self, submission), fields(has_document = submission.documento.is_some()))]
    pub async fn create(&self, submission: Submission) -> Result<SubmissionOutcome, WorkflowError> {
        let start = Instant::now();
        let form = self.validator.validate(&submission.fields)?;
        let file = submission
            .documento
            .ok_or_else(|| WorkflowError::validation("documento", "structural chart file is required"))?;

        let first_role = form.company.first_role();
        let recipient = form
            .approvers
            .get(first_role)
            .ok_or(WorkflowError::UnresolvedRecipient(first_role))?
            .to_string();

        let documento = self.upload(file).await?;
        let id = self.ids.next_id()?;
        let mut record = WorkflowRecord::new(
            id,
            Uuid::new_v4().to_string(),
            form.company,
            form.approvers,
            form.perfil,
            Some(documento),
        );
        let changes = vec![ChangeLog::new(
            "estado".to_string(),
            "Initial submission".to_string(),
            None,
            Some(json!(record.estado().to_string())),
        )];
        let actor = record.creator().map(str::to_string);
        record.push_audit(AuditLog::new(
            record.next_audit_seq(),
            AuditAction::Created,
            None,
            actor,
            format!("Profile '{}' submitted", record.perfil().nombre_cargo),
            changes,
        ));

        let record = self.store.insert(record).await?;
        let notification = self
            .notifier
            .dispatch(notify::approval_request(&record, first_role, &recipient));
        self.events
            .publish(WorkflowEvent::from_record(EventKind::Submitted, &record, None));

        info!(
            record_id = record.id(),
            workflow_id = %record.workflow_id(),
            company = %record.company(),
            estado = %record.estado(),
            duration_ms = start.elapsed().as_millis(),
            "Submission created"
        );
        Ok(SubmissionOutcome {
            record,
            notification,
        })
    }

    /// Restarts the approval chain of an existing record with new form data.
    #[instrument(skip(self, submission), fields(record_id = id, has_document = submission.documento.is_some()))]
    pub async fn resubmit(&self, id: u64, submission: Submission) -> Result<SubmissionOutcome, WorkflowError> {
        let start = Instant::now();
        let mut record = self.store.get(id).await?;
        let form = self.validator.validate(&submission.fields)?;

        if form.company != record.company() {
            return Err(WorkflowError::validation(
                "company",
                format!("cannot change from {} to {}", record.company(), form.company),
            ));
        }

        let first_role = form.company.first_role();
        let recipient = form
            .approvers
            .get(first_role)
            .ok_or(WorkflowError::UnresolvedRecipient(first_role))?
            .to_string();

        let documento = match submission.documento {
            Some(file) => Some(self.upload(file).await?),
            None => {
                debug!("No new document supplied, keeping the current one");
                record.documento.clone()
            }
        };

        let previous = record.estado.clone();
        let changes = vec![
            ChangeLog::new(
                "estado".to_string(),
                "Approval chain restarted".to_string(),
                Some(json!(previous.to_string())),
                Some(json!(WorkflowState::Pending(first_role).to_string())),
            ),
            ChangeLog::new(
                "etapas_aprobadas".to_string(),
                "Approval chain restarted".to_string(),
                Some(json!(record.etapas_aprobadas)),
                Some(json!([])),
            ),
        ];

        record.estado = WorkflowState::Pending(first_role);
        record.etapas_aprobadas.clear();
        record.observations = Observations::default();
        record.approvers = form.approvers;
        record.perfil = form.perfil;
        record.documento = documento;
        let actor = record.creator().map(str::to_string);
        record.push_audit(AuditLog::new(
            record.next_audit_seq(),
            AuditAction::Resubmitted,
            None,
            actor,
            "Profile resubmitted".to_string(),
            changes,
        ));
        record.touch();

        let record = self.store.update_if(&record, &previous).await.map_err(|e| {
            warn!(error = %e, "Resubmission lost a concurrent update");
            WorkflowError::from(e)
        })?;

        let notification = self
            .notifier
            .dispatch(notify::approval_request(&record, first_role, &recipient));
        self.events
            .publish(WorkflowEvent::from_record(EventKind::Resubmitted, &record, None));

        info!(
            previous = %previous,
            estado = %record.estado(),
            duration_ms = start.elapsed().as_millis(),
            "Submission restarted"
        );
        Ok(SubmissionOutcome {
            record,
            notification,
        })
    }

    pub async fn get(&self, id: u64) -> Result<WorkflowRecord, WorkflowError> {
        Ok(self.store.get(id).await?)
    }

    pub async fn history(&self, workflow_id: &str) -> Result<Vec<WorkflowRecord>, WorkflowError> {
        let rows = self.store.history(workflow_id).await?;
        if rows.is_empty() {
            return Err(WorkflowError::NotFound(workflow_id.to_string()));
        }
        Ok(rows)
    }

    pub async fn list(&self) -> Result<Vec<WorkflowRecord>, WorkflowError> {
        Ok(self.store.list().await?)
    }

    async fn upload(&self, file: UploadedFile) -> Result<String, WorkflowError> {
        if file.bytes.is_empty() {
            return Err(WorkflowError::validation("documento", "file is empty"));
        }
        let object_name = format!("{}-{}", Uuid::new_v4(), sanitize_filename(&file.filename));
        debug!(object = %object_name, size = file.size(), "Uploading structural chart");
        let url = self
            .blobs
            .upload(&object_name, file.bytes, &file.content_type)
            .await?;
        Ok(url)
    }
}

impl std::fmt::Debug for SubmissionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionHandler")
            .field("ids", &self.ids)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.trim_matches('_').is_empty() {
        "documento".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filenames_are_made_storage_safe() {
        assert_eq!(sanitize_filename("C:\\docs\\Organigrama área.pdf"), "Organigrama__rea.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("   "), "documento");
    }
}
