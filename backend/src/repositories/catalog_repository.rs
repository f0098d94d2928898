//! Database repository for catalog items and their reservable quantity.

use crate::database::models::{CatalogItem, CreateCatalogItem};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashSet;

const ITEM_COLUMNS: &str =
    "item_id, seller_id, name, description, price, category, status, quantity, created_at";

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CatalogRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_item(
        &self,
        item_id: &str,
        seller_id: &str,
        item: &CreateCatalogItem,
    ) -> Result<CatalogItem> {
        let item = sqlx::query_as::<_, CatalogItem>(&format!(
            "INSERT INTO catalog_items
             (item_id, seller_id, name, description, price, category, status, quantity, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 'available', ?, ?)
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(item_id)
        .bind(seller_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .bind(&item.category)
        .bind(item.quantity)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(item)
    }

    pub async fn get_item_by_id(&self, item_id: &str) -> Result<Option<CatalogItem>> {
        let item = sqlx::query_as::<_, CatalogItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM catalog_items WHERE item_id = ?"
        ))
        .bind(item_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(item)
    }

    /// Marks an item deleted. Returns `false` when no such item exists.
    pub async fn soft_delete_item(&self, item_id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE catalog_items SET status = 'deleted' WHERE item_id = ?")
            .bind(item_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Takes one unit of every listed id, in order, inside a single transaction.
    ///
    /// Each decrement is a conditional update, so an id succeeds only while
    /// the item is available with a positive quantity. Repeated ids take one
    /// unit per occurrence; once an id fails, its later occurrences fail
    /// without another query since nothing in the batch adds stock back.
    ///
    /// # Returns
    /// One flag per input id, position-aligned with `item_ids`
    pub async fn reserve_units(&self, item_ids: &[String]) -> Result<Vec<bool>> {
        let mut tx = self.pool.begin().await?;
        let mut successful = Vec::with_capacity(item_ids.len());
        let mut exhausted: HashSet<&str> = HashSet::new();

        for item_id in item_ids {
            if exhausted.contains(item_id.as_str()) {
                successful.push(false);
                continue;
            }

            let result = sqlx::query(
                "UPDATE catalog_items
                 SET quantity = quantity - 1
                 WHERE item_id = ? AND quantity > 0 AND status = 'available'",
            )
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

            let reserved = result.rows_affected() == 1;
            if !reserved {
                exhausted.insert(item_id);
            }
            successful.push(reserved);
        }

        tx.commit().await?;
        Ok(successful)
    }

    /// Gives back one unit per listed id regardless of item status.
    pub async fn release_units(&self, item_ids: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for item_id in item_ids {
            sqlx::query("UPDATE catalog_items SET quantity = quantity + 1 WHERE item_id = ?")
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
