//! # Wishlist Commands

use serde::Serialize;
use tracing::debug;

use resham_core::validation::validate_id;
use resham_core::WishlistItem;

use crate::error::ApiResult;
use crate::state::{AppState, CartSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistResponse {
    pub items: Vec<WishlistItem>,
    pub count: usize,
}

impl From<Vec<WishlistItem>> for WishlistResponse {
    fn from(items: Vec<WishlistItem>) -> Self {
        WishlistResponse {
            count: items.len(),
            items,
        }
    }
}

pub fn get_wishlist(state: &AppState) -> WishlistResponse {
    debug!("get_wishlist command");
    state.wishlist.items().into()
}

/// Saves a product. Saving it twice is not an error.
pub async fn add_to_wishlist(state: &AppState, product_id: &str) -> ApiResult<WishlistResponse> {
    debug!(product_id = %product_id, "add_to_wishlist command");
    validate_id("productId", product_id)?;
    Ok(state.wishlist.add_product_by_id(product_id).await?.into())
}

pub fn remove_from_wishlist(state: &AppState, product_id: &str) -> WishlistResponse {
    debug!(product_id = %product_id, "remove_from_wishlist command");
    state.wishlist.remove_from_wishlist(product_id).into()
}

pub fn clear_wishlist(state: &AppState) -> WishlistResponse {
    debug!("clear_wishlist command");
    state.wishlist.clear_wishlist().into()
}

/// Moves a saved product into the cart (stock-gated).
pub async fn move_to_cart(state: &AppState, product_id: &str) -> ApiResult<CartSnapshot> {
    debug!(product_id = %product_id, "move_to_cart command");
    validate_id("productId", product_id)?;
    state.wishlist.move_to_cart(product_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_state;
    use crate::state::test_support::product;

    #[tokio::test]
    async fn test_wishlist_commands_flow() {
        let (state, _) = test_state(vec![product("a", 100, 5), product("b", 50, 0)]);

        add_to_wishlist(&state, "a").await.unwrap();
        add_to_wishlist(&state, "a").await.unwrap();
        let list = add_to_wishlist(&state, "b").await.unwrap();
        assert_eq!(list.count, 2);

        let cart = move_to_cart(&state, "a").await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(get_wishlist(&state).count, 1);

        assert!(move_to_cart(&state, "b").await.is_err());
        assert_eq!(remove_from_wishlist(&state, "b").count, 0);
        assert_eq!(clear_wishlist(&state).count, 0);
    }
}
