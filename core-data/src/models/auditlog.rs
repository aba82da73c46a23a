use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::role::Role;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Created,
    Approved,
    Rejected,
    Resubmitted,
}

/// One entry of a record's history. Entries are only ever appended.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AuditLog {
    seq: u32,

    #[serde(with = "time::serde::iso8601")]
    timestamp: OffsetDateTime,

    action: AuditAction,

    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,

    #[serde(skip_serializing_if = "Option::is_none")]
    actor: Option<Box<str>>,

    description: Box<str>,

    changes: Box<[ChangeLog]>,
}

impl AuditLog {
    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn timestamp(&self) -> &OffsetDateTime {
        &self.timestamp
    }

    pub fn action(&self) -> AuditAction {
        self.action
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn changes(&self) -> &[ChangeLog] {
        &self.changes
    }

    pub fn new(
        seq: u32,
        action: AuditAction,
        role: Option<Role>,
        actor: Option<String>,
        description: String,
        changes: Vec<ChangeLog>,
    ) -> Self {
        AuditLog {
            seq,
            timestamp: OffsetDateTime::now_utc(),
            action,
            role,
            actor: actor.map(String::into_boxed_str),
            description: description.into_boxed_str(),
            changes: changes.into_boxed_slice(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChangeLog {
    field: Box<str>,

    old_value: Option<serde_json::Value>,

    new_value: Option<serde_json::Value>,

    reason: Box<str>,
}

impl ChangeLog {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn old_value(&self) -> Option<&serde_json::Value> {
        self.old_value.as_ref()
    }

    pub fn new_value(&self) -> Option<&serde_json::Value> {
        self.new_value.as_ref()
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn new(
        field: String,
        reason: String,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
    ) -> Self {
        ChangeLog {
            field: field.into_boxed_str(),
            old_value,
            new_value,
            reason: reason.into_boxed_str(),
        }
    }
}
