pub mod engine;
pub mod ids;
pub mod notify;
pub mod submission;
pub mod transition;
pub mod validation;

pub use self::engine::{DecisionOutcome, WorkflowEngine};
pub use self::ids::IdGenerator;
pub use self::notify::{Dispatch, Notifier, DEFAULT_MAIL_TIMEOUT};
pub use self::submission::{SubmissionHandler, SubmissionOutcome};
pub use self::transition::{Notice, Transition};
pub use self::validation::{default_rules, FieldKind, ValidatedForm, ValidationRule, Validator};
