//! In-memory storage
//!
//! Backs unit tests and database-less local runs. Mutexes make every
//! operation atomic, so the compare-and-swap semantics match the PostgreSQL
//! implementation.

use async_trait::async_trait;
use shared::models::{MenuItem, Order, OrderStatus};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{Catalog, OrderStore, StoreError, StoreResult};

#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<i64, MenuItem>>,
    orders: Mutex<HashMap<i64, Order>>,
    sequences: Mutex<HashMap<String, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a menu item (test/dev helper)
    pub fn put_item(&self, item: MenuItem) {
        self.items.lock().unwrap().insert(item.id, item);
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn get_item(&self, id: i64) -> StoreResult<Option<MenuItem>> {
        Ok(self.items.lock().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut orders = self.orders.lock().unwrap();
        if orders.values().any(|o| o.order_number == order.order_number) {
            return Err(StoreError::Duplicate(format!(
                "order number {}",
                order.order_number
            )));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
        Ok(self.orders.lock().unwrap().get(&id).cloned())
    }

    async fn get_order_by_number(&self, order_number: &str) -> StoreResult<Option<Order>> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .values()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    async fn list_active(&self) -> StoreResult<Vec<Order>> {
        let mut active: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.status.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|o| (o.created_at, o.id));
        Ok(active)
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> StoreResult<Vec<Order>> {
        let mut all: Vec<Order> = self.orders.lock().unwrap().values().cloned().collect();
        all.sort_by_key(|o| (std::cmp::Reverse(o.created_at), std::cmp::Reverse(o.id)));
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn update_status_if(
        &self,
        id: i64,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> StoreResult<bool> {
        let mut orders = self.orders.lock().unwrap();
        match orders.get_mut(&id) {
            Some(order) if order.status == expected => {
                order.status = target;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound(format!("order {}", id))),
        }
    }

    async fn set_payment_intent(&self, id: i64, intent_id: &str) -> StoreResult<()> {
        let mut orders = self.orders.lock().unwrap();
        match orders.get_mut(&id) {
            Some(order) => {
                order.payment_intent_id = Some(intent_id.to_string());
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("order {}", id))),
        }
    }

    async fn next_order_sequence(&self, day: &str) -> StoreResult<i64> {
        let mut sequences = self.sequences.lock().unwrap();
        let value = sequences.entry(day.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn delete_order(&self, id: i64) -> StoreResult<bool> {
        Ok(self.orders.lock().unwrap().remove(&id).is_some())
    }
}
