//! PostgreSQL storage
//!
//! Plain sqlx queries over a shared pool. Status transitions use
//! `UPDATE … WHERE status = $expected` and check `rows_affected`, which makes
//! the swap atomic at the database without explicit row locks.

use async_trait::async_trait;
use shared::models::{MenuItem, Order, OrderLine, OrderStatus, OrderType};
use sqlx::PgPool;
use std::collections::HashMap;

use super::{Catalog, OrderStore, StoreError, StoreResult};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_lines(&self, order_ids: &[i64]) -> StoreResult<HashMap<i64, Vec<OrderLine>>> {
        let rows: Vec<LineRow> = sqlx::query_as(
            "SELECT id, order_id, item_id, name, unit_price, quantity, customization
             FROM order_lines WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(order_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    async fn attach_lines(&self, row: OrderRow) -> StoreResult<Order> {
        let mut lines = self.load_lines(&[row.id]).await?;
        let lines = lines.remove(&row.id).unwrap_or_default();
        row.into_order(lines)
    }
}

/// Raw order row; status/type are validated when converting to the model
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    customer_name: String,
    customer_phone: String,
    customer_email: Option<String>,
    order_type: String,
    delivery_address: Option<String>,
    notes: Option<String>,
    status: String,
    subtotal: i64,
    tax: i64,
    delivery_fee: i64,
    total: i64,
    payment_intent_id: Option<String>,
    created_at: i64,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> StoreResult<Order> {
        let status = OrderStatus::from_db(&self.status).ok_or_else(|| {
            StoreError::Database(format!("order {}: unknown status '{}'", self.id, self.status))
        })?;
        let order_type = OrderType::from_db(&self.order_type).ok_or_else(|| {
            StoreError::Database(format!(
                "order {}: unknown order_type '{}'",
                self.id, self.order_type
            ))
        })?;
        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_email: self.customer_email,
            order_type,
            delivery_address: self.delivery_address,
            notes: self.notes,
            status,
            subtotal: self.subtotal,
            tax: self.tax,
            delivery_fee: self.delivery_fee,
            total: self.total,
            payment_intent_id: self.payment_intent_id,
            created_at: self.created_at,
            lines,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LineRow {
    id: i64,
    order_id: i64,
    item_id: i64,
    name: String,
    unit_price: i64,
    quantity: i32,
    customization: Option<String>,
}

impl From<LineRow> for OrderLine {
    fn from(row: LineRow) -> Self {
        OrderLine {
            id: row.id,
            order_id: row.order_id,
            item_id: row.item_id,
            name: row.name,
            unit_price: row.unit_price,
            quantity: row.quantity,
            customization: row.customization,
        }
    }
}

#[async_trait]
impl Catalog for PgStore {
    async fn get_item(&self, id: i64) -> StoreResult<Option<MenuItem>> {
        let row: Option<(i64, String, i64, bool)> =
            sqlx::query_as("SELECT id, name, price, available FROM menu_items WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id, name, price, available)| MenuItem {
            id,
            name,
            price,
            available,
        }))
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut txn = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders
             (id, order_number, customer_name, customer_phone, customer_email, order_type,
              delivery_address, notes, status, subtotal, tax, delivery_fee, total,
              payment_intent_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(&order.customer_email)
        .bind(order.order_type.as_db())
        .bind(&order.delivery_address)
        .bind(&order.notes)
        .bind(order.status.as_db())
        .bind(order.subtotal)
        .bind(order.tax)
        .bind(order.delivery_fee)
        .bind(order.total)
        .bind(&order.payment_intent_id)
        .bind(order.created_at)
        .execute(&mut *txn)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(format!("order number {}", order.order_number))
            }
            _ => StoreError::from(e),
        })?;

        for line in &order.lines {
            sqlx::query(
                "INSERT INTO order_lines (id, order_id, item_id, name, unit_price, quantity, customization)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(line.id)
            .bind(order.id)
            .bind(line.item_id)
            .bind(&line.name)
            .bind(line.unit_price)
            .bind(line.quantity)
            .bind(&line.customization)
            .execute(&mut *txn)
            .await?;
        }

        txn.commit().await?;
        Ok(())
    }

    async fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.attach_lines(row).await?)),
            None => Ok(None),
        }
    }

    async fn get_order_by_number(&self, order_number: &str) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.attach_lines(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_active(&self) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT * FROM orders WHERE status IN ('pending', 'preparing')
             ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut lines = self.load_lines(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let order_lines = lines.remove(&row.id).unwrap_or_default();
                row.into_order(order_lines)
            })
            .collect()
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> =
            sqlx::query_as("SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut lines = self.load_lines(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let order_lines = lines.remove(&row.id).unwrap_or_default();
                row.into_order(order_lines)
            })
            .collect()
    }

    async fn update_status_if(
        &self,
        id: i64,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
            .bind(target.as_db())
            .bind(id)
            .bind(expected.as_db())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_payment_intent(&self, id: i64, intent_id: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE orders SET payment_intent_id = $1 WHERE id = $2")
            .bind(intent_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("order {}", id)));
        }
        Ok(())
    }

    async fn next_order_sequence(&self, day: &str) -> StoreResult<i64> {
        let value: i64 = sqlx::query_scalar(
            "INSERT INTO order_sequences (day, value) VALUES ($1, 1)
             ON CONFLICT (day) DO UPDATE SET value = order_sequences.value + 1
             RETURNING value",
        )
        .bind(day)
        .fetch_one(&self.pool)
        .await?;
        Ok(value)
    }

    async fn delete_order(&self, id: i64) -> StoreResult<bool> {
        // Lines go with the order via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
