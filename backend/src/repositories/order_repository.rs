//! Database repository for orders and order lines.
//!
//! Order ids are allocated per user. Writes that belong to order placement
//! take an explicit connection so the caller can run them in one transaction
//! together with the cart clear.

use crate::database::models::{Order, OrderLine, OrderStatus};
use anyhow::Result;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

const ORDER_COLUMNS: &str = "user_id, order_id, status, created_at, updated_at";

pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a CREATED order with the next id for this user (max + 1, from 1).
    pub async fn create_order_with(conn: &mut SqliteConnection, user_id: &str) -> Result<Order> {
        let now = Utc::now();
        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (user_id, order_id, status, created_at, updated_at)
             VALUES (?, (SELECT COALESCE(MAX(order_id), 0) + 1 FROM orders WHERE user_id = ?), ?, ?, ?)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(user_id)
        .bind(OrderStatus::Created)
        .bind(now)
        .bind(now)
        .fetch_one(conn)
        .await?;

        Ok(order)
    }

    pub async fn insert_line_with(
        conn: &mut SqliteConnection,
        user_id: &str,
        order_id: i64,
        item_id: &str,
        quantity: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO order_lines (user_id, order_id, item_id, quantity) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(order_id)
        .bind(item_id)
        .bind(quantity)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn get_order(&self, user_id: &str, order_id: i64) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? AND order_id = ?"
        ))
        .bind(user_id)
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// All orders of a user, optionally restricted to one status, oldest first.
    pub async fn list_orders(
        &self,
        user_id: &str,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        let orders = match status {
            Some(status) => {
                sqlx::query_as::<_, Order>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders
                     WHERE user_id = ? AND status = ?
                     ORDER BY order_id"
                ))
                .bind(user_id)
                .bind(status)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Order>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY order_id"
                ))
                .bind(user_id)
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(orders)
    }

    pub async fn list_lines(&self, user_id: &str, order_id: i64) -> Result<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            "SELECT item_id, quantity FROM order_lines
             WHERE user_id = ? AND order_id = ?
             ORDER BY rowid",
        )
        .bind(user_id)
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Moves an order from `from` to `to`.
    ///
    /// # Returns
    /// `false` if the order was no longer in `from` (a concurrent transition won)
    pub async fn transition_status(
        &self,
        user_id: &str,
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE orders SET status = ?, updated_at = ?
             WHERE user_id = ? AND order_id = ? AND status = ?",
        )
        .bind(to)
        .bind(Utc::now())
        .bind(user_id)
        .bind(order_id)
        .bind(from)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Claims the release of a cancelled order's units.
    ///
    /// # Returns
    /// `false` if the order is not cancelled or its units were already
    /// released (or are being released by another caller)
    pub async fn claim_release(&self, user_id: &str, order_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE orders SET units_released = 1, updated_at = ?
             WHERE user_id = ? AND order_id = ? AND status = ? AND units_released = 0",
        )
        .bind(Utc::now())
        .bind(user_id)
        .bind(order_id)
        .bind(OrderStatus::Cancelled)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Undoes `claim_release` after the units could not be handed back.
    pub async fn unclaim_release(&self, user_id: &str, order_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE orders SET units_released = 0, updated_at = ?
             WHERE user_id = ? AND order_id = ?",
        )
        .bind(Utc::now())
        .bind(user_id)
        .bind(order_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
