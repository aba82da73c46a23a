use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::role::Role;

const PENDING_PREFIX: &str = "pendiente por ";
const REJECTED_PREFIX: &str = "rechazado por ";
const APPROVED_BY_ALL: &str = "aprobado por todos";

/// Position of a record in its approval chain.
///
/// Stored and rendered as the plain strings the HR team reads in their
/// inbox: `pendiente por director`, `aprobado por todos`,
/// `rechazado por calidad (ana@merkahorro.com)`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(into = "String", try_from = "String")]
pub enum WorkflowState {
    Pending(Role),
    ApprovedByAll,
    RejectedBy { role: Role, approver: String },
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkflowState::Pending(_))
    }

    pub fn pending_role(&self) -> Option<Role> {
        match self {
            WorkflowState::Pending(role) => Some(*role),
            _ => None,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::Pending(role) => write!(f, "{}{}", PENDING_PREFIX, role),
            WorkflowState::ApprovedByAll => f.write_str(APPROVED_BY_ALL),
            WorkflowState::RejectedBy { role, approver } => {
                write!(f, "{}{} ({})", REJECTED_PREFIX, role, approver)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownState(pub String);

impl fmt::Display for UnknownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown workflow state '{}'", self.0)
    }
}

impl std::error::Error for UnknownState {}

impl FromStr for WorkflowState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == APPROVED_BY_ALL {
            return Ok(WorkflowState::ApprovedByAll);
        }
        if let Some(role) = s.strip_prefix(PENDING_PREFIX) {
            return role
                .parse()
                .map(WorkflowState::Pending)
                .map_err(|_| UnknownState(s.to_string()));
        }
        if let Some(rest) = s.strip_prefix(REJECTED_PREFIX) {
            let (role, approver) = match rest.split_once(' ') {
                Some((role, approver)) => (role, approver.trim()),
                None => (rest, ""),
            };
            let role = role.parse().map_err(|_| UnknownState(s.to_string()))?;
            let approver = approver
                .strip_prefix('(')
                .and_then(|a| a.strip_suffix(')'))
                .unwrap_or(approver)
                .to_string();
            return Ok(WorkflowState::RejectedBy { role, approver });
        }
        Err(UnknownState(s.to_string()))
    }
}

impl From<WorkflowState> for String {
    fn from(state: WorkflowState) -> Self {
        state.to_string()
    }
}

impl TryFrom<String> for WorkflowState {
    type Error = UnknownState;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_strings() {
        assert_eq!(
            WorkflowState::Pending(Role::Director).to_string(),
            "pendiente por director"
        );
        assert_eq!(WorkflowState::ApprovedByAll.to_string(), "aprobado por todos");
        let rejected = WorkflowState::RejectedBy {
            role: Role::Seguridad,
            approver: "sst@merkahorro.com".to_string(),
        };
        assert_eq!(rejected.to_string(), "rechazado por seguridad (sst@merkahorro.com)");
        assert_eq!(rejected.to_string().parse::<WorkflowState>().unwrap(), rejected);
    }

    #[test]
    fn test_unknown_state_is_an_error() {
        assert!("pendiente por rrhh".parse::<WorkflowState>().is_err());
        assert!("borrador".parse::<WorkflowState>().is_err());
    }

    #[test]
    fn test_only_pending_is_open() {
        assert!(!WorkflowState::Pending(Role::Area).is_terminal());
        assert!(WorkflowState::ApprovedByAll.is_terminal());
    }
}
