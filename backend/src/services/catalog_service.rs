//! Catalog business logic and the in-process reservation gate.
//!
//! Item quantity changes only through [`ReservationGate::reserve`] and
//! [`ReservationGate::release`]. Both run their whole batch under one
//! process-wide lock and inside one SQLite transaction, and every decrement
//! is a conditional update, so concurrent placements can never both take the
//! last unit.

use crate::database::models::{CatalogItem, CreateCatalogItem};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::catalog_repository::CatalogRepository;
use crate::services::reservation_gate::ReservationGate;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use validator::Validate;

/// Service layer for catalog operations.
#[derive(Clone)]
pub struct CatalogService {
    pool: SqlitePool,
    /// Serializes reserve/release batches.
    gate_lock: Arc<Mutex<()>>,
}

impl CatalogService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            gate_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Lists a new item on behalf of a staff member.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` for malformed item data
    pub async fn create_item(
        &self,
        seller_id: &str,
        create_item: CreateCatalogItem,
    ) -> ServiceResult<CatalogItem> {
        create_item
            .validate()
            .map_err(ServiceError::from_validation_errors)?;

        let item_id = uuid::Uuid::now_v7().to_string();
        let repo = CatalogRepository::new(&self.pool);
        let item = repo.create_item(&item_id, seller_id, &create_item).await?;

        info!(
            "Catalog item {} created by {} with quantity {}",
            item.item_id, seller_id, item.quantity
        );
        Ok(item)
    }

    /// Retrieves an item by ID, returning error if not found.
    pub async fn get_item_required(&self, item_id: &str) -> ServiceResult<CatalogItem> {
        let repo = CatalogRepository::new(&self.pool);
        repo.get_item_by_id(item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Item", item_id))
    }

    /// Soft-deletes an item. Deleted items can no longer be reserved.
    pub async fn delete_item(&self, item_id: &str) -> ServiceResult<()> {
        let repo = CatalogRepository::new(&self.pool);
        if !repo.soft_delete_item(item_id).await? {
            return Err(ServiceError::not_found("Item", item_id));
        }

        info!("Catalog item {} deleted", item_id);
        Ok(())
    }
}

#[async_trait]
impl ReservationGate for CatalogService {
    async fn reserve(&self, item_ids: &[String]) -> ServiceResult<Vec<bool>> {
        let _guard = self.gate_lock.lock().await;

        let repo = CatalogRepository::new(&self.pool);
        let successful = repo.reserve_units(item_ids).await?;

        let reserved = successful.iter().filter(|ok| **ok).count();
        if reserved < item_ids.len() {
            warn!(
                "Reserved {} of {} requested units",
                reserved,
                item_ids.len()
            );
        }

        Ok(successful)
    }

    async fn release(&self, item_ids: &[String]) -> ServiceResult<()> {
        let _guard = self.gate_lock.lock().await;

        let repo = CatalogRepository::new(&self.pool);
        repo.release_units(item_ids).await?;

        info!("Released {} units", item_ids.len());
        Ok(())
    }
}
