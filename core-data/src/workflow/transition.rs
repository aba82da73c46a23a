use serde_json::json;

use crate::models::auditlog::{AuditAction, AuditLog, ChangeLog};
use crate::models::errors::WorkflowError;
use crate::models::record::WorkflowRecord;
use crate::models::role::{Decision, Role};
use crate::models::state::WorkflowState;

/// Who must hear about a transition once it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The next role in the chain has to review.
    NextApprover(Role),
    /// Every role approved; the creator is told.
    Completed,
    /// A role rejected; the creator is told.
    Rejected { role: Role, approver: String, comment: String },
}

/// Result of applying one decision to a record in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub role: Role,
    pub decision: Decision,
    pub previous: WorkflowState,
    pub recipient: String,
    pub notice: Notice,
}

impl WorkflowRecord {
    /// Applies `decision` by `role`. On error the record is left untouched.
    pub fn apply_decision(
        &mut self,
        role: Role,
        decision: Decision,
        comment: Option<&str>,
    ) -> Result<Transition, WorkflowError> {
        if !self.company.applies(role) {
            return Err(WorkflowError::RoleNotApplicable {
                role,
                company: self.company,
            });
        }

        let expected = WorkflowState::Pending(role);
        if self.estado != expected {
            return Err(WorkflowError::StaleOrInvalidState {
                id: self.id,
                expected: expected.to_string(),
                current: self.estado.to_string(),
            });
        }

        let comment = comment.map(str::trim).filter(|c| !c.is_empty());
        let previous = self.estado.clone();

        match decision {
            Decision::Approve => {
                let (next_state, notice, recipient_role) = match self.company.next_role(role) {
                    Some(next) => (WorkflowState::Pending(next), Notice::NextApprover(next), next),
                    None => (
                        WorkflowState::ApprovedByAll,
                        Notice::Completed,
                        self.company.creator_role(),
                    ),
                };
                let recipient = self
                    .approvers
                    .get(recipient_role)
                    .ok_or(WorkflowError::UnresolvedRecipient(recipient_role))?
                    .to_string();

                let stages_before = json!(self.etapas_aprobadas);
                self.mark_stage_approved(role);
                self.observations.set(role, comment.map(str::to_string));
                self.estado = next_state;

                let changes = vec![
                    ChangeLog::new(
                        "estado".to_string(),
                        format!("Approved by {}", role),
                        Some(json!(previous.to_string())),
                        Some(json!(self.estado.to_string())),
                    ),
                    ChangeLog::new(
                        "etapas_aprobadas".to_string(),
                        format!("Stage {} completed", role),
                        Some(stages_before),
                        Some(json!(self.etapas_aprobadas)),
                    ),
                    ChangeLog::new(
                        format!("observacion_{}", role),
                        "Approver comment".to_string(),
                        None,
                        comment.map(|c| json!(c)),
                    ),
                ];
                self.record_audit(AuditAction::Approved, role, changes);

                Ok(Transition {
                    role,
                    decision,
                    previous,
                    recipient,
                    notice,
                })
            }
            Decision::Reject => {
                let comment = comment.ok_or(WorkflowError::MissingRejectionComment)?;
                let creator_role = self.company.creator_role();
                let recipient = self
                    .approvers
                    .get(creator_role)
                    .ok_or(WorkflowError::UnresolvedRecipient(creator_role))?
                    .to_string();
                let approver = self
                    .approvers
                    .get(role)
                    .unwrap_or("sin asignar")
                    .to_string();

                self.observations.set(role, Some(comment.to_string()));
                self.estado = WorkflowState::RejectedBy {
                    role,
                    approver: approver.clone(),
                };

                let changes = vec![
                    ChangeLog::new(
                        "estado".to_string(),
                        format!("Rejected by {}", role),
                        Some(json!(previous.to_string())),
                        Some(json!(self.estado.to_string())),
                    ),
                    ChangeLog::new(
                        format!("observacion_{}", role),
                        "Rejection reason".to_string(),
                        None,
                        Some(json!(comment)),
                    ),
                ];
                self.record_audit(AuditAction::Rejected, role, changes);

                Ok(Transition {
                    role,
                    decision,
                    previous,
                    recipient,
                    notice: Notice::Rejected {
                        role,
                        approver,
                        comment: comment.to_string(),
                    },
                })
            }
        }
    }

    fn record_audit(&mut self, action: AuditAction, role: Role, changes: Vec<ChangeLog>) {
        let actor = self.approvers.get(role).map(str::to_string);
        let description = match action {
            AuditAction::Approved => format!("Profile approved by {}", role),
            AuditAction::Rejected => format!("Profile rejected by {}", role),
            AuditAction::Created => "Profile submitted".to_string(),
            AuditAction::Resubmitted => "Profile resubmitted".to_string(),
        };
        let audit = AuditLog::new(self.next_audit_seq(), action, Some(role), actor, description, changes);
        self.push_audit(audit);
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::company::Company;
    use crate::models::profile::JobProfile;
    use crate::models::record::Approvers;

    fn record(company: Company) -> WorkflowRecord {
        WorkflowRecord::new(
            42,
            "wf-42".to_string(),
            company,
            Approvers {
                area: Some("area@empresa.com".into()),
                director: Some("director@empresa.com".into()),
                gerencia: Some("gerencia@empresa.com".into()),
                calidad: Some("calidad@empresa.com".into()),
                seguridad: Some("sst@empresa.com".into()),
            },
            JobProfile {
                nombre_cargo: "Cajero".into(),
                mision_cargo: "Atender la caja".into(),
                ..JobProfile::default()
            },
            None,
        )
    }

    #[test]
    fn test_approval_moves_to_next_role() {
        let mut r = record(Company::Merkahorro);
        let t = r.apply_decision(Role::Area, Decision::Approve, Some("  ok  ")).unwrap();
        assert_eq!(r.estado(), &WorkflowState::Pending(Role::Director));
        assert_eq!(r.etapas_aprobadas(), &[Role::Area]);
        assert_eq!(r.observations().get(Role::Area), Some("ok"));
        assert_eq!(t.recipient, "director@empresa.com");
        assert_eq!(t.notice, Notice::NextApprover(Role::Director));
        assert_eq!(r.historial().len(), 1);
    }

    #[test]
    fn test_out_of_order_role_is_refused_without_changes() {
        let mut r = record(Company::Merkahorro);
        let before = r.clone();
        let err = r.apply_decision(Role::Gerencia, Decision::Approve, None).unwrap_err();
        assert!(matches!(err, WorkflowError::StaleOrInvalidState { .. }));
        assert_eq!(r, before);
    }

    #[test]
    fn test_area_never_applies_to_construahorro() {
        let mut r = record(Company::Construahorro);
        let err = r.apply_decision(Role::Area, Decision::Approve, None).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::RoleNotApplicable { role: Role::Area, company: Company::Construahorro }
        ));
    }

    #[test]
    fn test_rejection_needs_a_comment() {
        let mut r = record(Company::Merkahorro);
        let err = r.apply_decision(Role::Area, Decision::Reject, Some("   ")).unwrap_err();
        assert!(matches!(err, WorkflowError::MissingRejectionComment));
        assert_eq!(r.estado(), &WorkflowState::Pending(Role::Area));
    }

    #[test]
    fn test_rejection_is_terminal() {
        let mut r = record(Company::Megamayoristas);
        let t = r.apply_decision(Role::Area, Decision::Reject, Some("falta misión")).unwrap();
        assert_eq!(r.estado().to_string(), "rechazado por area (area@empresa.com)");
        assert!(r.etapas_aprobadas().is_empty());
        // Megamayoristas reports back to the director slot.
        assert_eq!(t.recipient, "director@empresa.com");
        let err = r.apply_decision(Role::Area, Decision::Approve, None).unwrap_err();
        assert!(matches!(err, WorkflowError::StaleOrInvalidState { .. }));
    }

    #[test]
    fn test_rejection_by_unassigned_role() {
        let mut r = record(Company::Megamayoristas);
        r.approvers.area = None;
        r.apply_decision(Role::Area, Decision::Reject, Some("incompleto")).unwrap();
        assert_eq!(r.estado().to_string(), "rechazado por area (sin asignar)");
    }

    #[test]
    fn test_missing_next_approver_leaves_record_untouched() {
        let mut r = record(Company::Merkahorro);
        r.approvers.director = Some(" ".into());
        let before = r.clone();
        let err = r.apply_decision(Role::Area, Decision::Approve, None).unwrap_err();
        assert!(matches!(err, WorkflowError::UnresolvedRecipient(Role::Director)));
        assert_eq!(r, before);
    }

    #[test]
    fn test_full_chain_ends_approved_by_all() {
        let mut r = record(Company::Construahorro);
        for role in Company::Construahorro.roles() {
            r.apply_decision(*role, Decision::Approve, None).unwrap();
        }
        assert_eq!(r.estado(), &WorkflowState::ApprovedByAll);
        assert_eq!(r.etapas_aprobadas(), Company::Construahorro.roles());
    }
}
