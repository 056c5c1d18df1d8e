//! Broadcast channel carrying per-batch progress and lifecycle events.
//!
//! Observers (UI pollers, reporting) subscribe rather than scrape logs. The
//! engine publishes after every processed record and every state transition.

use crate::models::BatchSnapshot;
use tokio::sync::broadcast;
use uuid::Uuid;

/// What happened to the batch at this point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchEventKind {
    Loaded,
    Started,
    RecordProcessed,
    Paused,
    Resumed,
    Completed,
    Deleted,
    /// start/resume issued in a state that cannot accept it; no-op.
    StateNotice,
}

/// Event published to observers, carrying the batch snapshot taken in the
/// same update that produced it.
#[derive(Debug, Clone)]
pub struct BatchEvent {
    pub batch_id: Uuid,
    pub kind: BatchEventKind,
    pub snapshot: BatchSnapshot,
    pub detail: Option<String>,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

/// High-throughput publisher for batch lifecycle events.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<BatchEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event for a batch.
    ///
    /// A broadcast send fails only when there are no subscribers, which is
    /// acceptable here: the engine publishes regardless of listeners.
    pub fn publish(&self, kind: BatchEventKind, snapshot: BatchSnapshot, detail: Option<String>) {
        let event = BatchEvent {
            batch_id: snapshot.id,
            kind,
            snapshot,
            detail,
            published_at: chrono::Utc::now(),
        };
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Batch;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let publisher = EventPublisher::new(8);
        let mut rx = publisher.subscribe();

        let snapshot = Batch::new().snapshot();
        publisher.publish(BatchEventKind::Loaded, snapshot.clone(), None);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, BatchEventKind::Loaded);
        assert_eq!(event.batch_id, snapshot.id);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_tolerated() {
        let publisher = EventPublisher::new(8);
        publisher.publish(BatchEventKind::Started, Batch::new().snapshot(), None);
        assert_eq!(publisher.subscriber_count(), 0);
    }
}
