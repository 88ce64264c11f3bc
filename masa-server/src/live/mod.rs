//! Order feed hub — real-time fan-out to kitchen displays and status pages
//!
//! ```text
//! OrderLedger ──publish──► OrderFeedHub (broadcast)
//!                              ├── WS session (kitchen display 1)
//!                              ├── WS session (kitchen display 2)
//!                              └── WS session (customer status page)
//! ```
//!
//! Delivery is at-least-once. Events are prompts to re-fetch authoritative
//! state from the order API, never the state itself, so duplicates, drops
//! under lag, and reordering are all harmless.

use shared::order::OrderEvent;
use tokio::sync::broadcast;

/// Broadcast channel capacity — enough to buffer connection-time bursts
const BROADCAST_CAPACITY: usize = 256;

/// Fan-out hub for order events.
///
/// The `epoch` is a unique identifier generated on each startup. Clients use
/// it to detect server restarts and trigger a full re-fetch.
#[derive(Clone)]
pub struct OrderFeedHub {
    tx: broadcast::Sender<OrderEvent>,
    epoch: String,
}

impl OrderFeedHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "Order feed hub started with new epoch");
        Self { tx, epoch }
    }

    /// Server instance epoch (unique per startup)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Publish an event to all current subscribers.
    ///
    /// A send with no active receivers is not an error; the ledger is the
    /// source of truth and consumers catch up on connect.
    pub fn publish(&self, event: OrderEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Order event published with no active subscribers");
        }
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for OrderFeedHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::OrderStatus;
    use shared::order::OrderEventKind;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let hub = OrderFeedHub::new();
        let mut rx = hub.subscribe();

        hub.publish(OrderEvent::created(
            1,
            "ORD-20250806-0001",
            OrderStatus::Pending,
        ));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.order_id, 1);
        assert_eq!(event.kind, OrderEventKind::Created);
    }

    #[tokio::test]
    async fn test_all_subscribers_receive() {
        let hub = OrderFeedHub::new();
        let mut rx1 = hub.subscribe();
        let mut rx2 = hub.subscribe();

        hub.publish(OrderEvent::status_changed(
            7,
            "ORD-20250806-0007",
            OrderStatus::Preparing,
        ));

        assert_eq!(rx1.recv().await.unwrap().order_id, 7);
        assert_eq!(rx2.recv().await.unwrap().order_id, 7);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_not_an_error() {
        let hub = OrderFeedHub::new();
        hub.publish(OrderEvent::created(
            1,
            "ORD-20250806-0001",
            OrderStatus::Pending,
        ));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_epoch_unique_per_instance() {
        let a = OrderFeedHub::new();
        let b = OrderFeedHub::new();
        assert_ne!(a.epoch(), b.epoch());
    }
}
