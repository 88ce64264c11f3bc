//! Priced order snapshot
//!
//! Output of the pricing engine and input to the order ledger. Line names and
//! unit prices are resolved from the catalog at pricing time and persisted
//! as-is; later catalog changes never alter an existing order.

use serde::{Deserialize, Serialize};

/// A resolved line: catalog snapshot + requested quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PricedLine {
    pub item_id: i64,
    /// Name snapshot at pricing time
    pub name: String,
    /// Unit price snapshot in minor units
    pub unit_price: i64,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customization: Option<String>,
}

impl PricedLine {
    pub fn line_total(&self) -> i64 {
        self.unit_price * self.quantity as i64
    }
}

/// A fully priced cart, ready to persist or to size a payment intent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    /// Σ(unit_price × quantity) in minor units
    pub subtotal: i64,
    /// round_half_up(subtotal × tax_rate) in minor units
    pub tax: i64,
    /// Fixed fee for delivery orders, 0 otherwise
    pub delivery_fee: i64,
    /// subtotal + tax + delivery_fee
    pub total: i64,
}
