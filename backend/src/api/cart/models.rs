//! Request and response bodies for the cart endpoints.

use crate::database::models::CartLine;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of add, increase and decrease
#[derive(Debug, Deserialize, Validate)]
pub struct CartQuantityRequest {
    #[validate(length(min = 1, message = "Item id is required"))]
    pub item_id: String,

    #[validate(range(min = 1, max = 1000, message = "Quantity must be between 1 and 1000"))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CartItemRequest {
    #[validate(length(min = 1, message = "Item id is required"))]
    pub item_id: String,
}

/// Cart contents as two position-aligned arrays
#[derive(Debug, Serialize, Deserialize)]
pub struct CartListResponse {
    pub item_ids: Vec<String>,
    pub quantities: Vec<i64>,
}

impl From<Vec<CartLine>> for CartListResponse {
    fn from(lines: Vec<CartLine>) -> Self {
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
