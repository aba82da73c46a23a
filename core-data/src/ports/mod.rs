pub mod blob;
pub mod events;
pub mod mail;
pub mod store;

pub use self::blob::{BlobError, BlobStore, InMemoryBlobStore};
pub use self::events::{BroadcastPublisher, EventPublisher, NoopPublisher};
pub use self::mail::{Attachment, Email, LogMailService, MailError, MailService, RecordingMailService};
pub use self::store::{InMemoryRecordStore, RecordStore, StoreError};
