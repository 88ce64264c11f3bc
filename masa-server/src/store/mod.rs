//! Storage traits
//!
//! Two narrow interfaces over the persistence layer:
//! - [`Catalog`]: read-only menu item lookup (owned by the admin back office)
//! - [`OrderStore`]: durable order rows with atomic insert and
//!   compare-and-swap status updates
//!
//! [`postgres::PgStore`] is the production implementation; [`memory::MemoryStore`]
//! backs unit tests and local development without a database.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use shared::models::{MenuItem, Order, OrderStatus};
use thiserror::Error;

/// Storage error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only menu item lookup
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_item(&self, id: i64) -> StoreResult<Option<MenuItem>>;
}

/// Durable order storage
///
/// Implementations must make `insert_order` atomic (parent row and all lines
/// commit together or not at all) and `update_status_if` a true
/// compare-and-swap: the write happens only if the stored status still equals
/// `expected` at write time.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist an order and all of its lines atomically.
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;

    async fn get_order(&self, id: i64) -> StoreResult<Option<Order>>;

    async fn get_order_by_number(&self, order_number: &str) -> StoreResult<Option<Order>>;

    /// Orders in `pending` or `preparing`, oldest first (kitchen fairness).
    async fn list_active(&self) -> StoreResult<Vec<Order>>;

    /// Recent orders for the back office, newest first.
    async fn list_recent(&self, limit: i64, offset: i64) -> StoreResult<Vec<Order>>;

    /// Compare-and-swap the status. Returns `Ok(true)` if the swap happened,
    /// `Ok(false)` if the stored status no longer matched `expected`.
    async fn update_status_if(
        &self,
        id: i64,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> StoreResult<bool>;

    /// Stamp the external payment reference on an order.
    async fn set_payment_intent(&self, id: i64, intent_id: &str) -> StoreResult<()>;

    /// Next value of the per-day order-number counter (crash-safe).
    async fn next_order_sequence(&self, day: &str) -> StoreResult<i64>;

    /// Administrative hard delete. Returns whether a row was removed.
    async fn delete_order(&self, id: i64) -> StoreResult<bool>;
}
