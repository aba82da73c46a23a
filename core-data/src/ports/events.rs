use tokio::sync::broadcast;
use tracing::debug;

use crate::models::event::WorkflowEvent;

/// Fire-and-forget fan-out to real-time observers. Implementations must not
/// block and must swallow their own failures.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: WorkflowEvent);
}

#[derive(Debug, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: WorkflowEvent) {}
}

/// In-process channel; every subscriber sees every event published after it
/// subscribed. Lagging subscribers lose the oldest events.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: WorkflowEvent) {
        if self.sender.send(event).is_err() {
            debug!("No event subscribers connected");
        }
    }
}
