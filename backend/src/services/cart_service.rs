//! Cart business logic service.
//!
//! The owning user is always passed explicitly; handlers take it from the
//! verified access token.

use crate::database::models::CartLine;
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::cart_repository::CartRepository;
use sqlx::SqlitePool;

/// Upper bound for the quantity of a single cart line.
pub const MAX_LINE_QUANTITY: i64 = 1000;

/// Service layer for cart operations.
pub struct CartService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> CartService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Adds `quantity` units of an item, creating the line if needed.
    ///
    /// # Errors
    /// Returns `ServiceError::InvalidOperation` if the line would grow past
    /// `MAX_LINE_QUANTITY` (nothing is changed)
    pub async fn add(&self, user_id: &str, item_id: &str, quantity: i64) -> ServiceResult<()> {
        Self::ensure_in_range(quantity)?;
        let repo = CartRepository::new(self.pool);
        if !repo
            .upsert_add(user_id, item_id, quantity, MAX_LINE_QUANTITY)
            .await?
        {
            return Err(Self::over_limit(item_id));
        }
        Ok(())
    }

    /// Removes a line entirely.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if the cart has no such line
    pub async fn remove(&self, user_id: &str, item_id: &str) -> ServiceResult<()> {
        let repo = CartRepository::new(self.pool);
        if !repo.delete_line(user_id, item_id).await? {
            return Err(ServiceError::not_found("Cart line", item_id));
        }
        Ok(())
    }

    pub async fn increase(&self, user_id: &str, item_id: &str, delta: i64) -> ServiceResult<()> {
        Self::ensure_in_range(delta)?;
        let repo = CartRepository::new(self.pool);
        let current = self.current_quantity(&repo, user_id, item_id).await?;
        let raised = current
            .checked_add(delta)
            .filter(|quantity| *quantity <= MAX_LINE_QUANTITY)
            .ok_or_else(|| Self::over_limit(item_id))?;
        repo.set_quantity(user_id, item_id, raised).await?;
        Ok(())
    }

    /// Lowers a line's quantity; reaching exactly zero deletes the line.
    ///
    /// # Errors
    /// Returns `ServiceError::InvalidOperation` if `delta` exceeds the
    /// current quantity (nothing is changed)
    pub async fn decrease(&self, user_id: &str, item_id: &str, delta: i64) -> ServiceResult<()> {
        Self::ensure_in_range(delta)?;
        let repo = CartRepository::new(self.pool);
        let current = self.current_quantity(&repo, user_id, item_id).await?;

        match current - delta {
            0 => {
                repo.delete_line(user_id, item_id).await?;
            }
            remaining if remaining > 0 => {
                repo.set_quantity(user_id, item_id, remaining).await?;
            }
            _ => {
                return Err(ServiceError::invalid_operation(format!(
                    "Cannot remove {} units of {}: only {} in cart",
                    delta, item_id, current
                )));
            }
        }
        Ok(())
    }

    pub async fn list(&self, user_id: &str) -> ServiceResult<Vec<CartLine>> {
        let repo = CartRepository::new(self.pool);
        Ok(repo.list_lines(user_id).await?)
    }

    /// Empties the cart; a no-op on an empty cart.
    pub async fn clear(&self, user_id: &str) -> ServiceResult<()> {
        let repo = CartRepository::new(self.pool);
        repo.clear(user_id).await?;
        Ok(())
    }

    async fn current_quantity(
        &self,
        repo: &CartRepository<'_>,
        user_id: &str,
        item_id: &str,
    ) -> ServiceResult<i64> {
        repo.get_quantity(user_id, item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart line", item_id))
    }

    fn ensure_in_range(quantity: i64) -> ServiceResult<()> {
        if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
            return Err(ServiceError::validation(format!(
                "quantity must be between 1 and {}",
                MAX_LINE_QUANTITY
            )));
        }
        Ok(())
    }

    fn over_limit(item_id: &str) -> ServiceError {
        ServiceError::invalid_operation(format!(
            "Cart line {} cannot hold more than {} units",
            item_id, MAX_LINE_QUANTITY
        ))
    }
}
