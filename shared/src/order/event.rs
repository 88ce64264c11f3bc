//! Order feed events
//!
//! Events are prompts to re-fetch, not state carriers: consumers (kitchen
//! display, customer status page) must read authoritative state from the
//! order API after a notification. Delivery is at-least-once; duplicates and
//! reordering are harmless by design.

use crate::models::OrderStatus;
use serde::{Deserialize, Serialize};

/// Order feed event kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
    Created,
    StatusChanged,
}

/// Order feed event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderEvent {
    pub order_id: i64,
    pub order_number: String,
    pub kind: OrderEventKind,
    /// Status at publish time (informational; re-fetch for truth)
    pub status: OrderStatus,
    /// UTC milliseconds
    pub timestamp: i64,
}

impl OrderEvent {
    pub fn created(order_id: i64, order_number: impl Into<String>, status: OrderStatus) -> Self {
        Self {
            order_id,
            order_number: order_number.into(),
            kind: OrderEventKind::Created,
            status,
            timestamp: crate::util::now_millis(),
        }
    }

    pub fn status_changed(
        order_id: i64,
        order_number: impl Into<String>,
        status: OrderStatus,
    ) -> Self {
        Self {
            order_id,
            order_number: order_number.into(),
            kind: OrderEventKind::StatusChanged,
            status,
            timestamp: crate::util::now_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_serde() {
        let event = OrderEvent::created(1, "ORD-20250806-0001", OrderStatus::Pending);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"created\""));
        assert!(json.contains("\"status\":\"pending\""));
    }
}
