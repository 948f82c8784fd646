use tokio::sync::broadcast;
use tracing::debug;

use crate::events::Event;

/// Fan-out channel for agent activity (analyses, trades, failures).
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Errs only when nobody is subscribed.
    pub fn publish(&self, event: Event) -> Result<usize, broadcast::error::SendError<Event>> {
        self.tx.send(event)
    }

    /// Best-effort publish. Returns whether any subscriber received the event.
    pub fn emit(&self, event: Event) -> bool {
        match self.tx.send(event) {
            Ok(_) => true,
            Err(e) => {
                debug!(
                    "📡 [BUS] No subscribers, dropped {} event for {}",
                    e.0.kind(),
                    e.0.ticker()
                );
                false
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
