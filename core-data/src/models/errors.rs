use thiserror::Error;

use crate::ports::blob::BlobError;
use crate::ports::store::StoreError;

use super::company::Company;
use super::role::Role;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid field '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("Invalid role: '{0}'")]
    InvalidRole(String),

    #[error("Invalid decision: '{0}'")]
    InvalidDecision(String),

    #[error("Role '{role}' does not take part in the {company} approval chain")]
    RoleNotApplicable { role: Role, company: Company },

    #[error("Record {id} is '{current}', expected '{expected}'")]
    StaleOrInvalidState {
        id: u64,
        expected: String,
        current: String,
    },

    #[error("A rejection must include an observation explaining why")]
    MissingRejectionComment,

    #[error("No approver is configured for role '{0}'")]
    UnresolvedRecipient(Role),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Upload error: {0}")]
    Upload(String),
}

impl WorkflowError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        WorkflowError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            WorkflowError::Validation { .. }
            | WorkflowError::InvalidRole(_)
            | WorkflowError::InvalidDecision(_)
            | WorkflowError::RoleNotApplicable { .. }
            | WorkflowError::StaleOrInvalidState { .. }
            | WorkflowError::MissingRejectionComment
            | WorkflowError::UnresolvedRecipient(_) => 400,
            WorkflowError::NotFound(_) => 404,
            WorkflowError::Persistence(_) | WorkflowError::Upload(_) => 500,
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => WorkflowError::NotFound(key),
            StoreError::Conflict {
                id,
                expected,
                current,
            } => WorkflowError::StaleOrInvalidState {
                id,
                expected,
                current,
            },
            other => WorkflowError::Persistence(other.to_string()),
        }
    }
}

impl From<BlobError> for WorkflowError {
    fn from(err: BlobError) -> Self {
        WorkflowError::Upload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_the_taxonomy() {
        assert_eq!(WorkflowError::validation("nombre_cargo", "is required").status_code(), 400);
        assert_eq!(WorkflowError::MissingRejectionComment.status_code(), 400);
        assert_eq!(WorkflowError::NotFound("7".into()).status_code(), 404);
        assert_eq!(WorkflowError::Upload("bucket offline".into()).status_code(), 500);
    }

    #[test]
    fn test_store_conflict_becomes_stale_state() {
        let err: WorkflowError = StoreError::Conflict {
            id: 7,
            expected: "pendiente por area".into(),
            current: "pendiente por director".into(),
        }
        .into();
        assert!(matches!(err, WorkflowError::StaleOrInvalidState { id: 7, .. }));
    }
}
