use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::models::errors::WorkflowError;
use crate::models::event::{EventKind, WorkflowEvent};
use crate::models::record::WorkflowRecord;
use crate::models::role::{Decision, Role};
use crate::ports::events::EventPublisher;
use crate::ports::store::RecordStore;

use super::notify::{self, Dispatch, Notifier};
use super::transition::Notice;

/// What a caller gets back after a decision was stored.
#[derive(Debug)]
pub struct DecisionOutcome {
    pub record: WorkflowRecord,
    pub message: String,
    pub notification: Dispatch,
}

/// Applies approver decisions: guard, transition, one conditional write,
/// then notification and broadcast.
#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<dyn RecordStore>,
    notifier: Notifier,
    events: Arc<dyn EventPublisher>,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn RecordStore>, notifier: Notifier, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            store,
            notifier,
            events,
        }
    }

    #[instrument(skip(self, comment), fields(record_id = id))]
    pub async fn apply_decision(
        &self,
        id: u64,
        role: &str,
        decision: &str,
        comment: Option<&str>,
    ) -> Result<DecisionOutcome, WorkflowError> {
        let start = Instant::now();
        let role: Role = role.parse()?;
        let decision: Decision = decision.parse()?;

        debug!(role = %role, decision = %decision, "Applying decision");

        let mut record = self.store.get(id).await?;
        let transition = record.apply_decision(role, decision, comment).map_err(|e| {
            warn!(role = %role, estado = %record.estado(), error = %e, "Decision refused");
            e
        })?;

        let record = self.store.update_if(&record, &transition.previous).await.map_err(|e| {
            warn!(error = %e, "Conditional update lost");
            WorkflowError::from(e)
        })?;

        let (email, kind, message) = match &transition.notice {
            Notice::NextApprover(next) => (
                notify::approval_request(&record, *next, &transition.recipient),
                EventKind::Approved,
                format!("Profile approved by {}; {} has been notified", role, next),
            ),
            Notice::Completed => (
                notify::final_approval(&record, &transition.recipient),
                EventKind::Completed,
                "Profile approved by every role; the creator has been notified".to_string(),
            ),
            Notice::Rejected {
                role,
                approver,
                comment,
            } => (
                notify::rejection_notice(&record, *role, approver, comment, &transition.recipient),
                EventKind::Rejected,
                format!("Profile rejected by {}; the creator has been notified", role),
            ),
        };

        let notification = self.notifier.dispatch(email);
        self.events
            .publish(WorkflowEvent::from_record(kind, &record, Some(role)));

        info!(
            role = %role,
            estado = %record.estado(),
            notified = %notification.recipient,
            duration_ms = start.elapsed().as_millis(),
            "Decision applied"
        );

        Ok(DecisionOutcome {
            record,
            message,
            notification,
        })
    }
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}
