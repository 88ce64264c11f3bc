//! Pricing engine
//!
//! Turns a client cart into a priced, snapshotted order. Prices come from the
//! catalog at call time; request DTOs have no price field, so a client hint
//! cannot exist, let alone win. All arithmetic is integer minor units; the
//! only decimal step is the tax multiplication, rounded half-up.
//!
//! Pure over its catalog read: no side effects, same catalog state in, same
//! figures out.


use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use shared::error::{AppError, ErrorCode};
use shared::models::OrderType;
use shared::order::{
    OrderLineRequest, PricedLine, PricedOrder, MAX_CUSTOMIZATION_LEN, MAX_LINE_QUANTITY,
    MAX_ORDER_LINES, MAX_UNIT_PRICE,
};
use thiserror::Error;

use crate::store::{Catalog, StoreError};

/// Pricing configuration (taken from server config at startup)
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Sales tax rate, e.g. 0.08875
    pub tax_rate: Decimal,
    /// Flat delivery fee in minor units
    pub delivery_fee: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            // NYC combined sales tax
            tax_rate: Decimal::new(8875, 5),
            delivery_fee: 500,
        }
    }
}

/// Pricing errors
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Too many items on order: {0} (max {MAX_ORDER_LINES})")]
    TooManyLines(usize),

    #[error("Menu item {0} not found")]
    ItemNotFound(i64),

    #[error("'{0}' is currently unavailable")]
    ItemUnavailable(String),

    #[error("Invalid quantity {quantity} for item {item_id} (must be 1..={MAX_LINE_QUANTITY})")]
    InvalidQuantity { item_id: i64, quantity: i32 },

    #[error("'{name}' has an out-of-range price ({price})")]
    PriceOutOfRange { name: String, price: i64 },

    #[error("Customization text too long for item {0}")]
    CustomizationTooLong(i64),

    #[error("Amount overflow")]
    Overflow,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        let message = err.to_string();
        match err {
            PricingError::EmptyCart => AppError::with_message(ErrorCode::OrderEmpty, message),
            PricingError::TooManyLines(_) => {
                AppError::with_message(ErrorCode::TooManyLines, message)
            }
            PricingError::ItemNotFound(id) => {
                AppError::with_message(ErrorCode::MenuItemNotFound, message)
                    .with_detail("item_id", id)
            }
            PricingError::ItemUnavailable(name) => {
                AppError::with_message(ErrorCode::MenuItemUnavailable, message)
                    .with_detail("item", name)
            }
            PricingError::InvalidQuantity { item_id, .. } => {
                AppError::with_message(ErrorCode::InvalidQuantity, message)
                    .with_detail("item_id", item_id)
            }
            PricingError::PriceOutOfRange { .. } => {
                AppError::with_message(ErrorCode::MenuItemInvalidPrice, message)
            }
            PricingError::CustomizationTooLong(_) => {
                AppError::with_message(ErrorCode::ValidationFailed, message)
            }
            PricingError::Overflow => AppError::with_message(ErrorCode::ValueOutOfRange, message),
            PricingError::Store(e) => {
                tracing::error!(error = %e, "Catalog read failed during pricing");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

/// Price a cart against the current catalog.
///
/// Each line is validated (quantity bounds, availability, price sanity) and
/// snapshotted (name + unit price at this instant). The snapshot is what the
/// ledger persists; later catalog price changes never retroactively alter an
/// existing order's total.
pub async fn price_order(
    catalog: &dyn Catalog,
    lines: &[OrderLineRequest],
    order_type: OrderType,
    config: &PricingConfig,
) -> Result<PricedOrder, PricingError> {
    if lines.is_empty() {
        return Err(PricingError::EmptyCart);
    }
    if lines.len() > MAX_ORDER_LINES {
        return Err(PricingError::TooManyLines(lines.len()));
    }

    let mut priced = Vec::with_capacity(lines.len());
    let mut subtotal: i64 = 0;

    for line in lines {
        if line.quantity < 1 || line.quantity > MAX_LINE_QUANTITY {
            return Err(PricingError::InvalidQuantity {
                item_id: line.item_id,
                quantity: line.quantity,
            });
        }
        if let Some(text) = &line.customization {
            if text.chars().count() > MAX_CUSTOMIZATION_LEN {
                return Err(PricingError::CustomizationTooLong(line.item_id));
            }
        }

        let item = catalog
            .get_item(line.item_id)
            .await?
            .ok_or(PricingError::ItemNotFound(line.item_id))?;

        if !item.available {
            return Err(PricingError::ItemUnavailable(item.name));
        }
        // Guard against catalog corruption: negative or absurd prices never
        // reach an order row.
        if item.price < 0 || item.price > MAX_UNIT_PRICE {
            return Err(PricingError::PriceOutOfRange {
                name: item.name,
                price: item.price,
            });
        }

        let line_total = item.price * line.quantity as i64;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or(PricingError::Overflow)?;

        priced.push(PricedLine {
            item_id: item.id,
            name: item.name,
            unit_price: item.price,
            quantity: line.quantity,
            customization: line.customization.clone(),
        });
    }

    let tax = round_tax(subtotal, config.tax_rate)?;
    let delivery_fee = match order_type {
        OrderType::Delivery => config.delivery_fee,
        OrderType::Pickup => 0,
    };
    let total = subtotal + tax + delivery_fee;

    Ok(PricedOrder {
        lines: priced,
        subtotal,
        tax,
        delivery_fee,
        total,
    })
}

/// round_half_up(subtotal × tax_rate) to the nearest minor unit.
///
/// Half-up (MidpointAwayFromZero), not bankers' rounding: $0.5325 of tax on a
/// $6.00 subtotal is charged as $0.53.
fn round_tax(subtotal: i64, tax_rate: Decimal) -> Result<i64, PricingError> {
    (Decimal::from(subtotal) * tax_rate)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::Overflow)
}
