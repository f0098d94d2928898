//! Order workflow: turning a cart into an order and cancelling orders.
//!
//! Placement reads the cart, expands every line into one item id per unit,
//! asks the reservation gate for all of them in one batch and then, in a
//! single transaction, records the order with the reserved units only and
//! clears the cart. Units the gate refused are dropped from the order.
//!
//! Reservation happens outside that transaction because the gate may live in
//! another process. If the transaction fails, the reserved units are handed
//! back; a crash between the two steps can still strand them.

use crate::database::models::{CartLine, Order, OrderLine, OrderStatus};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::cart_repository::CartRepository;
use crate::repositories::order_repository::OrderRepository;
use crate::services::reservation_gate::ReservationGate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

/// Outcome of one cart line during placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineOutcome {
    pub item_id: String,
    pub requested: i64,
    pub reserved: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order_id: i64,
    pub items: Vec<LineOutcome>,
}

/// Service layer for order operations.
pub struct OrderService<'a> {
    pool: &'a SqlitePool,
    gate: &'a dyn ReservationGate,
}

impl<'a> OrderService<'a> {
    pub fn new(pool: &'a SqlitePool, gate: &'a dyn ReservationGate) -> Self {
        Self { pool, gate }
    }

    /// Places an order from the user's current cart.
    ///
    /// # Errors
    /// Fails without creating an order or touching the cart if the cart
    /// cannot be read or the reservation call itself fails. Unavailable
    /// items are not errors; they are reported with `reserved < requested`.
    pub async fn place_order(&self, user_id: &str) -> ServiceResult<PlacedOrder> {
        let cart = CartRepository::new(self.pool).list_lines(user_id).await?;

        let unit_ids = expand_units(cart.iter().map(|line| (line.item_id.as_str(), line.quantity)));
        let flags = self.gate.reserve(&unit_ids).await?;
        if flags.len() != unit_ids.len() {
            return Err(ServiceError::external_service(format!(
                "Reservation returned {} flags for {} units",
                flags.len(),
                unit_ids.len()
            )));
        }

        let outcomes = tally(&cart, &flags);

        let committed = async {
            let mut tx = self.pool.begin().await?;
            let order = OrderRepository::create_order_with(&mut *tx, user_id).await?;
            for outcome in outcomes.iter().filter(|o| o.reserved > 0) {
                OrderRepository::insert_line_with(
                    &mut *tx,
                    user_id,
                    order.order_id,
                    &outcome.item_id,
                    outcome.reserved,
                )
                .await?;
            }
            CartRepository::clear_with(&mut *tx, user_id).await?;
            tx.commit().await?;
            Ok::<Order, anyhow::Error>(order)
        }
        .await;

        let order = match committed {
            Ok(order) => order,
            Err(err) => {
                error!("Recording order for {} failed: {}", user_id, err);
                self.hand_back(&unit_ids, &flags).await;
                return Err(err.into());
            }
        };

        let requested: i64 = outcomes.iter().map(|o| o.requested).sum();
        let reserved: i64 = outcomes.iter().map(|o| o.reserved).sum();
        if reserved < requested {
            warn!(
                "Order {} for {}: reserved {} of {} requested units",
                order.order_id, user_id, reserved, requested
            );
        }
        info!("Order {} placed for {}", order.order_id, user_id);

        Ok(PlacedOrder {
            order_id: order.order_id,
            items: outcomes,
        })
    }

    /// Cancels an order and returns its units to the catalog.
    ///
    /// Units are released at most once per order. If releasing fails the
    /// order stays CANCELLED and a later call retries the release;
    /// cancelling an order whose units are already back succeeds without
    /// touching the catalog.
    ///
    /// # Errors
    /// - `ServiceError::NotFound` if the user has no such order
    /// - `ServiceError::AlreadyFinished` if the order is FINISHED (no mutation)
    /// - the gate's error if the units could not be released
    pub async fn remove_order(&self, user_id: &str, order_id: i64) -> ServiceResult<()> {
        let repo = OrderRepository::new(self.pool);

        loop {
            let order = self.get_order_required(&repo, user_id, order_id).await?;
            match order.status {
                OrderStatus::Finished => return Err(ServiceError::already_finished(order_id)),
                OrderStatus::Cancelled => break,
                current => {
                    if repo
                        .transition_status(user_id, order_id, current, OrderStatus::Cancelled)
                        .await?
                    {
                        info!("Order {} for {} cancelled", order_id, user_id);
                        break;
                    }
                    // Status moved underneath us; look again.
                }
            }
        }

        if !repo.claim_release(user_id, order_id).await? {
            return Ok(());
        }

        let lines = repo.list_lines(user_id, order_id).await?;
        let unit_ids = expand_units(lines.iter().map(|line| (line.item_id.as_str(), line.quantity)));

        if let Err(err) = self.gate.release(&unit_ids).await {
            error!(
                "Order {} for {} cancelled but releasing {} units failed: {}",
                order_id,
                user_id,
                unit_ids.len(),
                err
            );
            if let Err(unclaim_err) = repo.unclaim_release(user_id, order_id).await {
                error!(
                    "Order {} for {} could not be marked for another release: {}",
                    order_id, user_id, unclaim_err
                );
            }
            return Err(err);
        }

        info!("Released {} units of order {} for {}", unit_ids.len(), order_id, user_id);
        Ok(())
    }

    pub async fn order_status(&self, user_id: &str, order_id: i64) -> ServiceResult<OrderStatus> {
        let repo = OrderRepository::new(self.pool);
        let order = self.get_order_required(&repo, user_id, order_id).await?;
        Ok(order.status)
    }

    pub async fn order_lines(&self, user_id: &str, order_id: i64) -> ServiceResult<Vec<OrderLine>> {
        let repo = OrderRepository::new(self.pool);
        self.get_order_required(&repo, user_id, order_id).await?;
        Ok(repo.list_lines(user_id, order_id).await?)
    }

    /// All orders of the user, optionally only those in `status`.
    pub async fn list_orders(
        &self,
        user_id: &str,
        status: Option<OrderStatus>,
    ) -> ServiceResult<Vec<Order>> {
        let repo = OrderRepository::new(self.pool);
        Ok(repo.list_orders(user_id, status).await?)
    }

    /// Moves an order one step along CREATED -> PREPARING -> DELIVERY -> FINISHED.
    ///
    /// # Errors
    /// `ServiceError::InvalidOperation` for FINISHED or CANCELLED orders, or
    /// when the order changed concurrently
    pub async fn advance_order(&self, user_id: &str, order_id: i64) -> ServiceResult<OrderStatus> {
        let repo = OrderRepository::new(self.pool);
        let order = self.get_order_required(&repo, user_id, order_id).await?;

        let next = order.status.next().ok_or_else(|| {
            ServiceError::invalid_operation(format!(
                "Order {} is {} and cannot progress",
                order_id, order.status
            ))
        })?;

        if !repo
            .transition_status(user_id, order_id, order.status, next)
            .await?
        {
            return Err(ServiceError::invalid_operation(format!(
                "Order {} changed concurrently",
                order_id
            )));
        }

        info!("Order {} for {} moved to {}", order_id, user_id, next);
        Ok(next)
    }

    async fn get_order_required(
        &self,
        repo: &OrderRepository<'_>,
        user_id: &str,
        order_id: i64,
    ) -> ServiceResult<Order> {
        repo.get_order(user_id, order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id.to_string()))
    }

    /// Best-effort return of units whose order could not be recorded.
    async fn hand_back(&self, unit_ids: &[String], flags: &[bool]) {
        let reserved: Vec<String> = unit_ids
            .iter()
            .zip(flags)
            .filter(|(_, ok)| **ok)
            .map(|(id, _)| id.clone())
            .collect();

        if reserved.is_empty() {
            return;
        }
        if let Err(err) = self.gate.release(&reserved).await {
            error!("{} reserved units could not be released: {}", reserved.len(), err);
        }
    }
}

/// One item id per unit, in line order.
fn expand_units<'l>(lines: impl Iterator<Item = (&'l str, i64)>) -> Vec<String> {
    lines
        .flat_map(|(item_id, quantity)| {
            std::iter::repeat_n(item_id.to_string(), quantity.max(0) as usize)
        })
        .collect()
}

/// Folds per-unit flags back into per-line counts.
fn tally(cart: &[CartLine], flags: &[bool]) -> Vec<LineOutcome> {
    let mut offset = 0;
    cart.iter()
        .map(|line| {
            let units = line.quantity.max(0) as usize;
            let reserved = flags
                .get(offset..offset + units)
                .map_or(0, |slice| slice.iter().filter(|ok| **ok).count());
            offset += units;
            LineOutcome {
                item_id: line.item_id.clone(),
                requested: line.quantity,
                reserved: reserved as i64,
            }
        })
        .collect()
}
