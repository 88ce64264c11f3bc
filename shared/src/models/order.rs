//! Order Model
//!
//! The order entity, its line items, and the status state machine.
//! Monetary fields are integer minor units (cents) throughout.

use serde::{Deserialize, Serialize};

/// Order status
///
/// Valid transitions:
///
/// ```text
/// pending ──► preparing ──► ready ──► completed
///    │            │           │
///    └────────────┴───────────┴─────► cancelled
/// ```
///
/// `completed` and `cancelled` are terminal. Everything else is rejected by
/// [`OrderStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Whether this status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the order still occupies the kitchen queue
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Preparing)
    }

    /// Validate a state machine edge
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        match (self, target) {
            (Self::Pending, Self::Preparing) => true,
            (Self::Preparing, Self::Ready) => true,
            (Self::Ready, Self::Completed) => true,
            // Any non-terminal state can be cancelled
            (from, Self::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Storage representation (lowercase text column)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse the storage representation
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "preparing" => Some(Self::Preparing),
            "ready" => Some(Self::Ready),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// All statuses, for exhaustive table checks
    pub fn all() -> [OrderStatus; 5] {
        [
            Self::Pending,
            Self::Preparing,
            Self::Ready,
            Self::Completed,
            Self::Cancelled,
        ]
    }
}

/// Order type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    Pickup,
    Delivery,
}

impl OrderType {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pickup" => Some(Self::Pickup),
            "delivery" => Some(Self::Delivery),
            _ => None,
        }
    }
}

/// Order line item
///
/// Immutable once written: name and unit price are snapshots captured at
/// order-creation time and are never recomputed from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    /// Menu item reference
    pub item_id: i64,
    /// Item name snapshot
    pub name: String,
    /// Unit price snapshot in minor units
    pub unit_price: i64,
    pub quantity: i32,
    /// Free-text customization, bounded length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customization: Option<String>,
}

impl OrderLine {
    /// Line total in minor units
    pub fn line_total(&self) -> i64 {
        self.unit_price * self.quantity as i64
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: i64,
    /// Human-readable unique number, e.g. `ORD-20250806-0001`
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub order_type: OrderType,
    /// Required iff `order_type` is delivery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: OrderStatus,
    /// Subtotal in minor units: Σ(unit_price × quantity) over lines
    pub subtotal: i64,
    /// Tax in minor units, rounded half-up
    pub tax: i64,
    /// Delivery fee in minor units (0 for pickup)
    pub delivery_fee: i64,
    /// Total in minor units: subtotal + tax + delivery_fee
    pub total: i64,
    /// External payment intent reference, nullable until payment starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    /// Creation timestamp, UTC milliseconds
    pub created_at: i64,
    pub lines: Vec<OrderLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_EDGES: [(OrderStatus, OrderStatus); 6] = [
        (OrderStatus::Pending, OrderStatus::Preparing),
        (OrderStatus::Preparing, OrderStatus::Ready),
        (OrderStatus::Ready, OrderStatus::Completed),
        (OrderStatus::Pending, OrderStatus::Cancelled),
        (OrderStatus::Preparing, OrderStatus::Cancelled),
        (OrderStatus::Ready, OrderStatus::Cancelled),
    ];

    #[test]
    fn test_transition_table_exhaustive() {
        for from in OrderStatus::all() {
            for to in OrderStatus::all() {
                let expected = VALID_EDGES.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Preparing.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
    }

    #[test]
    fn test_db_roundtrip() {
        for status in OrderStatus::all() {
            assert_eq!(OrderStatus::from_db(status.as_db()), Some(status));
        }
        assert_eq!(OrderStatus::from_db("unknown"), None);

        for ty in [OrderType::Pickup, OrderType::Delivery] {
            assert_eq!(OrderType::from_db(ty.as_db()), Some(ty));
        }
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Preparing).unwrap();
        assert_eq!(json, "\"preparing\"");
        let parsed: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }

    #[test]
    fn test_line_total() {
        let line = OrderLine {
            id: 1,
            order_id: 1,
            item_id: 7,
            name: "Taco".to_string(),
            unit_price: 300,
            quantity: 2,
            customization: None,
        };
        assert_eq!(line.line_total(), 600);
    }
}
