pub mod auditlog;
pub mod company;
pub mod errors;
pub mod event;
pub mod profile;
pub mod record;
pub mod role;
pub mod state;

pub use self::auditlog::{AuditAction, AuditLog, ChangeLog};
pub use self::company::Company;
pub use self::errors::WorkflowError;
pub use self::event::{EventKind, WorkflowEvent};
pub use self::profile::{JobProfile, Submission, UploadedFile};
pub use self::record::{Approvers, Observations, WorkflowRecord};
pub use self::role::{Decision, Role};
pub use self::state::WorkflowState;
