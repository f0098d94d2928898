//! Database repository for shopping carts.
//!
//! A cart is the set of `cart_lines` rows owned by one user; a line exists
//! only while its quantity is positive.

use crate::database::models::CartLine;
use anyhow::Result;
use sqlx::{SqliteConnection, SqlitePool};

pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Quantity of one line, `None` if the user has no such line.
    pub async fn get_quantity(&self, user_id: &str, item_id: &str) -> Result<Option<i64>> {
        let quantity = sqlx::query_scalar::<_, i64>(
            "SELECT quantity FROM cart_lines WHERE user_id = ? AND item_id = ?",
        )
        .bind(user_id)
        .bind(item_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(quantity)
    }

    /// Creates the line or adds `quantity` to the existing one, as long as
    /// the result stays within `max_quantity`.
    ///
    /// # Returns
    /// `false` if the line exists and the sum would exceed `max_quantity`
    pub async fn upsert_add(
        &self,
        user_id: &str,
        item_id: &str,
        quantity: i64,
        max_quantity: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO cart_lines (user_id, item_id, quantity)
             VALUES (?, ?, ?)
             ON CONFLICT (user_id, item_id) DO UPDATE SET quantity = quantity + excluded.quantity
             WHERE quantity + excluded.quantity <= ?",
        )
        .bind(user_id)
        .bind(item_id)
        .bind(quantity)
        .bind(max_quantity)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn set_quantity(&self, user_id: &str, item_id: &str, quantity: i64) -> Result<()> {
        sqlx::query("UPDATE cart_lines SET quantity = ? WHERE user_id = ? AND item_id = ?")
            .bind(quantity)
            .bind(user_id)
            .bind(item_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Deletes one line. Returns `false` if it did not exist.
    pub async fn delete_line(&self, user_id: &str, item_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = ? AND item_id = ?")
            .bind(user_id)
            .bind(item_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Lists the user's cart in insertion order.
    pub async fn list_lines(&self, user_id: &str) -> Result<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            "SELECT item_id, quantity FROM cart_lines WHERE user_id = ? ORDER BY rowid",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    pub async fn clear(&self, user_id: &str) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::clear_with(&mut conn, user_id).await
    }

    /// Clears the cart on an explicit connection, typically a transaction.
    pub async fn clear_with(conn: &mut SqliteConnection, user_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM cart_lines WHERE user_id = ?")
            .bind(user_id)
            .execute(conn)
            .await?;

        Ok(())
    }
}
