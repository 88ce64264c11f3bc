//! Order ledger — the single source of truth for order state
//!
//! Owns order creation and the status state machine. All writes go through
//! here:
//!
//! - `create_order` validates customer info, snapshots the priced cart into
//!   durable rows (atomically, parent + lines together), and publishes a
//!   `created` event after the commit.
//! - `transition` applies a state-machine edge with a compare-and-swap
//!   discipline: of two racing writers exactly one wins; the loser gets a
//!   conflict and must re-fetch, never silently overwrite.
//!
//! Cancellation is an ordinary transition to `cancelled`, not a separate
//! code path, and orders are never hard-deleted in normal operation; only
//! the administrative `delete` override removes rows.

#[cfg(test)]
mod tests;

use chrono::Utc;
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderLine, OrderStatus, OrderType};
use shared::order::{CustomerInfo, OrderEvent, PricedOrder, MAX_NOTE_LEN, MAX_TEXT_FIELD_LEN};
use shared::util::{now_millis, snowflake_id};
use std::sync::Arc;
use thiserror::Error;

use crate::live::OrderFeedHub;
use crate::store::{OrderStore, StoreError};

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Required field missing: {0}")]
    MissingField(&'static str),

    #[error("Field too long: {0}")]
    FieldTooLong(&'static str),

    #[error("Delivery orders require a delivery address")]
    MissingDeliveryAddress,

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {from:?} -> {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order status changed concurrently, re-fetch and retry")]
    StatusConflict,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::MissingField(field) => {
                AppError::with_message(ErrorCode::RequiredField, message).with_detail("field", field)
            }
            LedgerError::FieldTooLong(field) => {
                AppError::with_message(ErrorCode::ValidationFailed, message)
                    .with_detail("field", field)
            }
            LedgerError::MissingDeliveryAddress => {
                AppError::with_message(ErrorCode::DeliveryAddressRequired, message)
            }
            LedgerError::NotFound(_) => AppError::with_message(ErrorCode::OrderNotFound, message),
            LedgerError::InvalidTransition { from, to } => {
                AppError::with_message(ErrorCode::InvalidTransition, message)
                    .with_detail("from", from.as_db())
                    .with_detail("to", to.as_db())
            }
            LedgerError::StatusConflict => {
                AppError::with_message(ErrorCode::StatusConflict, message)
            }
            LedgerError::Store(e) => {
                tracing::error!(error = %e, "Order store error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// The order ledger
pub struct OrderLedger {
    store: Arc<dyn OrderStore>,
    feed: OrderFeedHub,
}

impl OrderLedger {
    pub fn new(store: Arc<dyn OrderStore>, feed: OrderFeedHub) -> Self {
        Self { store, feed }
    }

    /// Create an order from a priced cart.
    ///
    /// The priced snapshot is persisted as-is; this function never re-reads
    /// the catalog. Parent row and lines commit atomically.
    pub async fn create_order(
        &self,
        customer: &CustomerInfo,
        order_type: OrderType,
        delivery_address: Option<String>,
        notes: Option<String>,
        priced: PricedOrder,
    ) -> LedgerResult<Order> {
        validate_order_request(customer, order_type, &delivery_address, &notes)?;

        let delivery_address = match order_type {
            OrderType::Delivery => delivery_address.filter(|a| !a.trim().is_empty()),
            OrderType::Pickup => None,
        };

        let order_number = self.next_order_number().await?;
        let order_id = snowflake_id();

        let lines: Vec<OrderLine> = priced
            .lines
            .iter()
            .map(|line| OrderLine {
                id: snowflake_id(),
                order_id,
                item_id: line.item_id,
                name: line.name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                customization: line.customization.clone(),
            })
            .collect();

        let order = Order {
            id: order_id,
            order_number: order_number.clone(),
            customer_name: customer.name.trim().to_string(),
            customer_phone: customer.phone.trim().to_string(),
            customer_email: customer.email.clone().filter(|e| !e.trim().is_empty()),
            order_type,
            delivery_address,
            notes,
            status: OrderStatus::Pending,
            subtotal: priced.subtotal,
            tax: priced.tax,
            delivery_fee: priced.delivery_fee,
            total: priced.total,
            payment_intent_id: None,
            created_at: now_millis(),
            lines,
        };

        self.store.insert_order(&order).await?;

        tracing::info!(
            order_id = order.id,
            order_number = %order.order_number,
            total = order.total,
            "Order created"
        );
        self.feed
            .publish(OrderEvent::created(order.id, &order.order_number, order.status));

        Ok(order)
    }

    /// Apply a status transition with compare-and-swap.
    ///
    /// The edge is validated against the status read here; the write only
    /// lands if that status still holds at write time. A lost race surfaces
    /// as [`LedgerError::StatusConflict`] so the caller re-fetches instead of
    /// clobbering the winner.
    pub async fn transition(&self, order_id: i64, target: OrderStatus) -> LedgerResult<Order> {
        let mut order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(order_id.to_string()))?;

        if !order.status.can_transition_to(target) {
            return Err(LedgerError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }

        let swapped = self
            .store
            .update_status_if(order_id, order.status, target)
            .await?;
        if !swapped {
            return Err(LedgerError::StatusConflict);
        }

        order.status = target;
        tracing::info!(
            order_id = order.id,
            order_number = %order.order_number,
            status = target.as_db(),
            "Order status changed"
        );
        self.feed.publish(OrderEvent::status_changed(
            order.id,
            &order.order_number,
            target,
        ));

        Ok(order)
    }

    pub async fn get_order(&self, order_id: i64) -> LedgerResult<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(order_id.to_string()))
    }

    pub async fn get_order_by_number(&self, order_number: &str) -> LedgerResult<Order> {
        self.store
            .get_order_by_number(order_number)
            .await?
            .ok_or_else(|| LedgerError::NotFound(order_number.to_string()))
    }

    /// Orders the kitchen still has to act on: `pending` and `preparing`,
    /// oldest first. The ordering is a fairness requirement, not cosmetics.
    pub async fn list_active(&self) -> LedgerResult<Vec<Order>> {
        Ok(self.store.list_active().await?)
    }

    /// Recent orders for the back office, newest first.
    pub async fn list_recent(&self, limit: i64, offset: i64) -> LedgerResult<Vec<Order>> {
        Ok(self.store.list_recent(limit, offset).await?)
    }

    /// Stamp the external payment reference on an order.
    pub async fn stamp_payment_reference(
        &self,
        order_id: i64,
        intent_id: &str,
    ) -> LedgerResult<()> {
        self.store
            .set_payment_intent(order_id, intent_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(id) => LedgerError::NotFound(id),
                other => LedgerError::Store(other),
            })
    }

    /// Administrative hard delete (out-of-band override; normal cancellation
    /// is a status transition).
    pub async fn delete_order(&self, order_id: i64) -> LedgerResult<()> {
        let deleted = self.store.delete_order(order_id).await?;
        if !deleted {
            return Err(LedgerError::NotFound(order_id.to_string()));
        }
        tracing::warn!(order_id, "Order hard-deleted by administrator");
        Ok(())
    }

    /// Generate the next order number: `ORD-YYYYMMDD-NNNN` with a crash-safe
    /// per-day counter.
    async fn next_order_number(&self) -> LedgerResult<String> {
        let day = Utc::now().format("%Y%m%d").to_string();
        let seq = self.store.next_order_sequence(&day).await?;
        Ok(format!("ORD-{}-{:04}", day, seq))
    }
}

/// Validate checkout input.
///
/// Cheap and synchronous so the HTTP layer can reject a bad request before
/// any pricing or payment work happens. `create_order` applies the same
/// checks again; the ledger never trusts its callers to have validated.
pub fn validate_order_request(
    customer: &CustomerInfo,
    order_type: OrderType,
    delivery_address: &Option<String>,
    notes: &Option<String>,
) -> LedgerResult<()> {
    validate_customer(customer)?;
    validate_optional_text(notes, "notes", MAX_NOTE_LEN)?;

    if order_type == OrderType::Delivery {
        let addr = delivery_address
            .as_ref()
            .filter(|a| !a.trim().is_empty())
            .ok_or(LedgerError::MissingDeliveryAddress)?;
        if addr.chars().count() > MAX_TEXT_FIELD_LEN {
            return Err(LedgerError::FieldTooLong("delivery_address"));
        }
    }
    Ok(())
}

fn validate_customer(customer: &CustomerInfo) -> LedgerResult<()> {
    if customer.name.trim().is_empty() {
        return Err(LedgerError::MissingField("customer_name"));
    }
    if customer.phone.trim().is_empty() {
        return Err(LedgerError::MissingField("customer_phone"));
    }
    if customer.name.chars().count() > MAX_TEXT_FIELD_LEN {
        return Err(LedgerError::FieldTooLong("customer_name"));
    }
    if customer.phone.chars().count() > MAX_TEXT_FIELD_LEN {
        return Err(LedgerError::FieldTooLong("customer_phone"));
    }
    if let Some(email) = &customer.email {
        if email.chars().count() > MAX_TEXT_FIELD_LEN {
            return Err(LedgerError::FieldTooLong("customer_email"));
        }
    }
    Ok(())
}

fn validate_optional_text(
    value: &Option<String>,
    field: &'static str,
    max_len: usize,
) -> LedgerResult<()> {
    if let Some(text) = value {
        if text.chars().count() > max_len {
            return Err(LedgerError::FieldTooLong(field));
        }
    }
    Ok(())
}
