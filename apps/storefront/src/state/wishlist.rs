//! # Wishlist Store
//!
//! Saved-for-later products. Same shape as [`CartStore`]: hydrate on
//! construction, persist after every mutation, announce on the event bus.

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use resham_core::{Catalog, ClientStore, Notice, Product, Wishlist, WishlistAdd, WishlistItem};

use super::cart::{CartSnapshot, CartStore};
use super::events::{EventBus, StoreEvent};
use super::persistence::{load_items, save_items, WISHLIST_KEY};
use crate::error::{ApiError, ApiResult};

pub struct WishlistStore {
    wishlist: Mutex<Wishlist>,
    catalog: Arc<dyn Catalog>,
    cart: Arc<CartStore>,
    store: Arc<dyn ClientStore>,
    events: EventBus,
}

impl WishlistStore {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        cart: Arc<CartStore>,
        store: Arc<dyn ClientStore>,
        events: EventBus,
    ) -> Self {
        let wishlist = Wishlist::from_items(load_items(store.as_ref(), WISHLIST_KEY));
        debug!(items = wishlist.len(), "Wishlist hydrated");

        WishlistStore {
            wishlist: Mutex::new(wishlist),
            catalog,
            cart,
            store,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Wishlist> {
        self.wishlist.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies `f`, persists, and returns its result with the new item list.
    fn mutate<F, R>(&self, f: F) -> (R, Vec<WishlistItem>)
    where
        F: FnOnce(&mut Wishlist) -> R,
    {
        let (result, items) = {
            let mut wishlist = self.lock();
            let result = f(&mut wishlist);
            save_items(self.store.as_ref(), WISHLIST_KEY, wishlist.items());
            (result, wishlist.items().to_vec())
        };

        self.events.publish(StoreEvent::WishlistChanged { count: items.len() });
        (result, items)
    }

    pub fn items(&self) -> Vec<WishlistItem> {
        self.lock().items().to_vec()
    }

    pub fn is_in_wishlist(&self, product_id: &str) -> bool {
        self.lock().contains(product_id)
    }

    /// Saves `product`. A duplicate changes nothing and says so.
    pub fn add_to_wishlist(&self, product: &Product) -> Vec<WishlistItem> {
        debug!(product_id = %product.id, "add_to_wishlist");

        let (outcome, items) = {
            let mut wishlist = self.lock();
            match wishlist.add(product) {
                WishlistAdd::Added => {
                    save_items(self.store.as_ref(), WISHLIST_KEY, wishlist.items());
                    (WishlistAdd::Added, wishlist.items().to_vec())
                }
                WishlistAdd::AlreadyPresent => {
                    (WishlistAdd::AlreadyPresent, wishlist.items().to_vec())
                }
            }
        };

        let product_id = product.id.clone();
        let name = product.name.clone();
        match outcome {
            WishlistAdd::Added => {
                info!(product_id = %product_id, "Added to wishlist");
                self.events.notice(Notice::AddedToWishlist { product_id, name });
                self.events.publish(StoreEvent::WishlistChanged { count: items.len() });
            }
            WishlistAdd::AlreadyPresent => {
                self.events.notice(Notice::AlreadyInWishlist { product_id, name });
            }
        }

        items
    }

    pub async fn add_product_by_id(&self, product_id: &str) -> ApiResult<Vec<WishlistItem>> {
        let product = self.catalog.get_product(product_id).await?;
        Ok(self.add_to_wishlist(&product))
    }

    /// Removes a saved product. Unknown ids are a no-op.
    pub fn remove_from_wishlist(&self, product_id: &str) -> Vec<WishlistItem> {
        debug!(product_id = %product_id, "remove_from_wishlist");
        let (removed, items) = self.mutate(|w| w.remove(product_id));
        if removed {
            self.events.notice(Notice::RemovedFromWishlist {
                product_id: product_id.to_string(),
            });
        }
        items
    }

    pub fn clear_wishlist(&self) -> Vec<WishlistItem> {
        debug!("clear_wishlist");
        self.mutate(Wishlist::clear).1
    }

    /// Adds a saved product to the cart, stock-gated, and drops it from the
    /// wishlist only when the add went through.
    pub async fn move_to_cart(&self, product_id: &str) -> ApiResult<CartSnapshot> {
        debug!(product_id = %product_id, "move_to_cart");

        if !self.is_in_wishlist(product_id) {
            return Err(ApiError::not_found("Wishlist item", product_id));
        }

        let snapshot = self.cart.add_product_by_id(product_id).await?;
        self.mutate(|w| w.remove(product_id));
        info!(product_id = %product_id, "Moved from wishlist to cart");
        Ok(snapshot)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
