use std::sync::Arc;
use std::time::Duration;

use core_data::ports::blob::{BlobStore, InMemoryBlobStore};
use core_data::ports::events::{BroadcastPublisher, EventPublisher};
use core_data::ports::mail::{LogMailService, MailService};
use core_data::ports::store::{InMemoryRecordStore, RecordStore};
use core_data::workflow::{IdGenerator, Notifier, SubmissionHandler, Validator, WorkflowEngine};
use tracing::{info, warn};

use crate::adapters::{HttpBlobStore, HttpMailService};
use crate::config::config::AppConfig;

/// Shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub engine: WorkflowEngine,
    pub submissions: SubmissionHandler,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        mail: Arc<dyn MailService>,
        events: Arc<dyn EventPublisher>,
        ids: IdGenerator,
        mail_timeout: Duration,
        max_upload_bytes: usize,
    ) -> Self {
        let notifier = Notifier::new(mail, mail_timeout);
        let submissions = SubmissionHandler::new(
            Arc::clone(&store),
            blobs,
            notifier.clone(),
            Arc::clone(&events),
            ids,
            Validator::default(),
        );
        let engine = WorkflowEngine::new(store, notifier, events);
        Self {
            engine,
            submissions,
            max_upload_bytes,
        }
    }
}

/// Wires the collaborators named in the configuration, falling back to
/// in-process ones for anything left unconfigured.
pub async fn build(config: &AppConfig) -> Result<AppState, String> {
    let ids = IdGenerator::new(config.ids.machine_id).map_err(|e| e.to_string())?;
    let mail_timeout = Duration::from_millis(config.mail.timeout_ms);

    let mail: Arc<dyn MailService> = match &config.mail.endpoint {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "Using HTTP mail service");
            Arc::new(
                HttpMailService::new(
                    endpoint.clone(),
                    config.mail.api_key.clone(),
                    config.mail.from.clone(),
                    mail_timeout,
                )
                .map_err(|e| e.to_string())?,
            )
        }
        None => {
            warn!("No mail endpoint configured, emails will only be logged");
            Arc::new(LogMailService)
        }
    };

    let blobs: Arc<dyn BlobStore> = match &config.storage.base_url {
        Some(base_url) => {
            info!(base_url = %base_url, bucket = %config.storage.bucket, "Using HTTP object storage");
            Arc::new(HttpBlobStore::new(
                base_url.clone(),
                config.storage.bucket.clone(),
                config.storage.api_key.clone(),
            ))
        }
        None => {
            warn!("No storage endpoint configured, documents are kept in memory");
            Arc::new(InMemoryBlobStore::new())
        }
    };

    let store = record_store(config).await?;
    let events = event_publisher(config)?;

    Ok(AppState::new(
        store,
        blobs,
        mail,
        events,
        ids,
        mail_timeout,
        config.server.max_upload_bytes,
    ))
}

#[cfg(feature = "postgres")]
async fn record_store(config: &AppConfig) -> Result<Arc<dyn RecordStore>, String> {
    match &config.database.url {
        Some(url) => {
            let store = crate::adapters::postgres::PgRecordStore::connect(url, config.database.max_connections)
                .await
                .map_err(|e| e.to_string())?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("No database url configured, records are kept in memory");
            Ok(Arc::new(InMemoryRecordStore::new()))
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn record_store(config: &AppConfig) -> Result<Arc<dyn RecordStore>, String> {
    if config.database.url.is_some() {
        warn!("database.url is set but the postgres feature is disabled");
    }
    warn!("Records are kept in memory");
    Ok(Arc::new(InMemoryRecordStore::new()))
}

#[cfg(feature = "kafka")]
fn event_publisher(config: &AppConfig) -> Result<Arc<dyn EventPublisher>, String> {
    match &config.kafka.bootstrap_servers {
        Some(servers) => {
            info!(servers = %servers, topic = %config.kafka.topic, "Publishing events to Kafka");
            let publisher = crate::adapters::kafka::KafkaEventPublisher::new(
                servers,
                config.kafka.topic.clone(),
                config.kafka.message_timeout_ms,
            )?;
            Ok(Arc::new(publisher))
        }
        None => Ok(Arc::new(BroadcastPublisher::new(64))),
    }
}

#[cfg(not(feature = "kafka"))]
fn event_publisher(config: &AppConfig) -> Result<Arc<dyn EventPublisher>, String> {
    if config.kafka.bootstrap_servers.is_some() {
        warn!("kafka.bootstrap_servers is set but the kafka feature is disabled");
    }
    Ok(Arc::new(BroadcastPublisher::new(64)))
}
