//! Request and response bodies for the order endpoints.

use crate::database::models::{Order, OrderLine, OrderStatus};
use crate::services::order_service::{LineOutcome, PlacedOrder};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct OrderIdRequest {
    pub order_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
}

/// Staff request naming an order of some customer
#[derive(Debug, Deserialize, Validate)]
pub struct AdvanceOrderRequest {
    #[validate(length(min = 1, message = "User id is required"))]
    pub user_id: String,
    pub order_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceOrderResponse {
    pub status: String,
    pub order_id: i64,
    pub items: Vec<LineOutcome>,
}

impl From<PlacedOrder> for PlaceOrderResponse {
    fn from(placed: PlacedOrder) -> Self {
        Self {
            status: "ok".to_string(),
            order_id: placed.order_id,
            items: placed.items,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderStatusResponse {
    pub status: OrderStatus,
}

/// Orders as two position-aligned arrays
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub order_ids: Vec<i64>,
    pub statuses: Vec<OrderStatus>,
}

impl From<Vec<Order>> for OrderListResponse {
    fn from(orders: Vec<Order>) -> Self {
        let (order_ids, statuses) = orders
            .into_iter()
            .map(|order| (order.order_id, order.status))
            .unzip();
        Self {
            order_ids,
            statuses,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemsResponse {
    pub item_ids: Vec<String>,
    pub quantities: Vec<i64>,
}

impl From<Vec<OrderLine>> for OrderItemsResponse {
    fn from(lines: Vec<OrderLine>) -> Self {
        let (item_ids, quantities) = lines
            .into_iter()
            .map(|line| (line.item_id, line.quantity))
            .unzip();
        Self {
            item_ids,
            quantities,
        }
    }
}
