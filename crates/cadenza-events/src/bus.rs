use tokio::sync::broadcast;

use crate::Event;

/// Event bus shared by the orchestrator and its host.
///
/// `publish()` never blocks and works without subscribers; events published
/// while nobody listens are dropped.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish anything convertible into [`Event`], e.g.
    /// `bus.publish(PlaybackEvent::EndOfStream)`.
    pub fn publish<E: Into<Event>>(&self, event: E) {
        let _ = self.tx.send(event.into());
    }

    /// Slow subscribers observe `RecvError::Lagged(n)` instead of blocking
    /// the publisher.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
