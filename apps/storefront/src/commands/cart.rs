//! # Cart Commands
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │────►│   Paid   │       │
//! │  │  Cart    │     │          │     │ (gateway)│     │          │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │                │             │
//! │                   add_to_cart       failed: cart     cart cleared      │
//! │                   update_cart_item  kept as is       by checkout       │
//! │                   remove_from_cart                                      │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────►                   │
//! │                                                      (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Deserialize;
use tracing::debug;

use resham_core::validation::validate_id;

use crate::error::ApiResult;
use crate::state::{AppState, CartSnapshot};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Current cart with items and derived totals.
pub fn get_cart(state: &AppState) -> CartSnapshot {
    debug!("get_cart command");
    state.cart.snapshot()
}

/// Adds one unit of a product, gated on live stock.
///
/// ## Returns
/// Updated cart. Stock refusals come back as `STOCK_UNAVAILABLE` or
/// `STOCK_LIMIT_EXCEEDED` and leave the cart unchanged.
pub async fn add_to_cart(state: &AppState, product_id: &str) -> ApiResult<CartSnapshot> {
    debug!(product_id = %product_id, "add_to_cart command");
    validate_id("productId", product_id)?;
    state.cart.add_product_by_id(product_id).await
}

/// Sets a line's quantity; zero or less removes it, above
/// `MAX_LINE_QUANTITY` is a validation error.
pub fn update_cart_item(state: &AppState, product_id: &str, quantity: i64) -> ApiResult<CartSnapshot> {
    debug!(product_id = %product_id, quantity, "update_cart_item command");
    validate_id("productId", product_id)?;
    state.cart.update_quantity(product_id, quantity)
}

pub fn remove_from_cart(state: &AppState, product_id: &str) -> CartSnapshot {
    debug!(product_id = %product_id, "remove_from_cart command");
    state.cart.remove_from_cart(product_id)
}

pub fn clear_cart(state: &AppState) -> CartSnapshot {
    debug!("clear_cart command");
    state.cart.clear_cart()
}
