//! Client-facing request types for the checkout flow
//!
//! None of these carry a price field. Prices are always resolved server-side
//! from the catalog at pricing time; a client cannot influence what it is
//! charged.

use crate::models::OrderType;
use serde::{Deserialize, Serialize};

/// Maximum quantity for a single order line
pub const MAX_LINE_QUANTITY: i32 = 100;
/// Maximum number of distinct lines per order
pub const MAX_ORDER_LINES: usize = 50;
/// Sanity bound on catalog unit prices ($1,000.00) to guard against corruption
pub const MAX_UNIT_PRICE: i64 = 100_000;
/// Maximum length of free-text customization per line
pub const MAX_CUSTOMIZATION_LEN: usize = 500;
/// Maximum length of order notes
pub const MAX_NOTE_LEN: usize = 500;
/// Maximum length of customer name / address fields
pub const MAX_TEXT_FIELD_LEN: usize = 200;

/// A single requested line: item reference + quantity + customization.
///
/// Never trusted for price; the catalog is the only price source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLineRequest {
    pub item_id: i64,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customization: Option<String>,
}

/// Customer contact information supplied at checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// POST /api/orders request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer: CustomerInfo,
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub lines: Vec<OrderLineRequest>,
}

/// PATCH /api/orders/{id}/status request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: crate::models::OrderStatus,
}

/// POST /api/payment-intents request body
///
/// `order_number` links the intent to an order row when one already exists;
/// the amount is always recomputed server-side from the lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub lines: Vec<OrderLineRequest>,
    pub order_type: OrderType,
    pub customer: CustomerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
}

/// POST /api/payment-intents response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publishable_key: Option<String>,
}

/// POST /api/payment-intents/confirm request body
///
/// Sent by the customer-facing page after returning from the payment flow.
/// The server re-queries the provider; the body carries references only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub intent_id: String,
    pub order_number: String,
}

/// POST /api/payment-intents/confirm response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmPaymentResponse {
    /// Provider payment state: succeeded | processing | requires_action | failed
    pub payment_status: String,
    /// Authoritative order state after reconciliation
    pub order: crate::models::Order,
}
