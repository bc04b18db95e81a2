//! # Store Events
//!
//! Everything the engines announce after a committed change. Subscribers
//! (an SSE stream, tests) get a `broadcast::Receiver`; engines never wait on
//! them and a send with nobody listening is not an error.

use serde::Serialize;
use tokio::sync::broadcast;

use resham_core::{CartTotals, CheckoutTransaction, Notice};

/// Buffered events per subscriber before the slowest one starts lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    Notice { notice: Notice },
    CartChanged { totals: CartTotals },
    WishlistChanged { count: usize },
    CheckoutUpdated { transaction: CheckoutTransaction },
}

/// Cloneable sending half shared by every engine.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        EventBus { sender }
    }

    pub fn publish(&self, event: StoreEvent) {
        // Err only means there are no subscribers right now
        let _ = self.sender.send(event);
    }

    pub fn notice(&self, notice: Notice) {
        self.publish(StoreEvent::Notice { notice });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
