use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::record::WorkflowRecord;
use super::role::Role;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Submitted,
    Resubmitted,
    Approved,
    Rejected,
    Completed,
}

/// Broadcast to real-time observers after a record changes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorkflowEvent {
    pub kind: EventKind,

    #[serde(with = "super::record::id_text")]
    pub record_id: u64,

    pub workflow_id: String,

    pub estado: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    #[serde(with = "time::serde::iso8601")]
    pub at: OffsetDateTime,
}

impl WorkflowEvent {
    pub fn from_record(kind: EventKind, record: &WorkflowRecord, role: Option<Role>) -> Self {
        Self {
            kind,
            record_id: record.id(),
            workflow_id: record.workflow_id().to_string(),
            estado: record.estado().to_string(),
            role,
            at: OffsetDateTime::now_utc(),
        }
    }
}
