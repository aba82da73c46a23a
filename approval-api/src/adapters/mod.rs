pub mod mail;
pub mod storage;

#[cfg(feature = "kafka")]
pub mod kafka;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use self::mail::HttpMailService;
pub use self::storage::HttpBlobStore;
