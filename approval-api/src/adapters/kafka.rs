use std::time::Duration;

use core_data::models::WorkflowEvent;
use core_data::ports::events::EventPublisher;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use tracing::{debug, error};

/// Publishes workflow events to a Kafka topic keyed by record id.
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl KafkaEventPublisher {
    pub fn new(bootstrap_servers: &str, topic: String, message_timeout_ms: u64) -> Result<Self, String> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .set("message.timeout.ms", message_timeout_ms.to_string())
            .create()
            .map_err(|e| format!("Producer creation error: {}", e))?;
        Ok(Self {
            producer,
            topic,
            timeout: Duration::from_millis(message_timeout_ms),
        })
    }
}

impl EventPublisher for KafkaEventPublisher {
    fn publish(&self, event: WorkflowEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Event serialization error");
                return;
            }
        };
        let producer = self.producer.clone();
        let topic = self.topic.clone();
        let timeout = self.timeout;

        tokio::spawn(async move {
            let key = event.record_id.to_string();
            let delivery = producer
                .send(
                    FutureRecord::to(&topic).payload(payload.as_bytes()).key(&key),
                    timeout,
                )
                .await;
            match delivery {
                Ok(_) => debug!(topic = %topic, record_id = event.record_id, "Event published"),
                Err((e, _)) => error!(error = %e, topic = %topic, "Kafka delivery error"),
            }
        });
    }
}
