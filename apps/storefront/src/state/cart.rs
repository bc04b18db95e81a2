//! # Cart Store
//!
//! The shopper's cart: the pure [`Cart`] behind a mutex, gated on a live
//! stock check and written through to the client store.
//!
//! ## Add-to-Cart Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    add_to_cart(product)                                 │
//! │                                                                         │
//! │  1. catalog.check_stock(id)        (exactly once, no lock held)         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  2. lock ──► Cart::add_item(product, stock)                             │
//! │        │       ├── stock ≤ 0          → StockUnavailable  (no change)   │
//! │        │       ├── qty + 1 > stock    → StockLimitExceeded (no change)  │
//! │        │       └── ok                 → increment / append              │
//! │        ▼                                                                │
//! │  3. save resham.cart ──► unlock                                         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  4. notice + CartChanged on the event bus                               │
//! │                                                                         │
//! │  NOTE: two adds racing between 1 and 2 can both pass the gate.          │
//! │        Known and left as is; checkout does not re-check stock.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, info};

use resham_core::{
    Cart, CartItem, CartTotals, Catalog, ClientStore, CoreError, CoreResult, Notice, Product,
};

use super::events::{EventBus, StoreEvent};
use super::persistence::{load_items, save_items, CART_KEY};
use crate::error::ApiResult;

/// Cart contents plus derived totals, as returned to the front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub totals: CartTotals,
}

impl From<&Cart> for CartSnapshot {
    fn from(cart: &Cart) -> Self {
        CartSnapshot {
            items: cart.items().to_vec(),
            totals: cart.totals(),
        }
    }
}

pub struct CartStore {
    cart: Mutex<Cart>,
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn ClientStore>,
    events: EventBus,
}

impl CartStore {
    /// Creates the store, hydrating from `resham.cart`.
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn ClientStore>, events: EventBus) -> Self {
        let cart = Cart::from_items(load_items(store.as_ref(), CART_KEY));
        debug!(lines = cart.line_count(), "Cart hydrated");

        CartStore {
            cart: Mutex::new(cart),
            catalog,
            store,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        f(&self.lock())
    }

    /// Runs `f` with write access, then persists and announces the result.
    fn mutate<F, R>(&self, f: F) -> (R, CartSnapshot)
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let (result, snapshot) = {
            let mut cart = self.lock();
            let result = f(&mut cart);
            save_items(self.store.as_ref(), CART_KEY, cart.items());
            (result, CartSnapshot::from(&*cart))
        };

        self.events.publish(StoreEvent::CartChanged {
            totals: snapshot.totals,
        });
        (result, snapshot)
    }

    /// Like `mutate`, but nothing is persisted or published when `f` fails.
    fn try_mutate<F, R>(&self, f: F) -> CoreResult<(R, CartSnapshot)>
    where
        F: FnOnce(&mut Cart) -> CoreResult<R>,
    {
        let (result, snapshot) = {
            let mut cart = self.lock();
            let result = f(&mut cart)?;
            save_items(self.store.as_ref(), CART_KEY, cart.items());
            (result, CartSnapshot::from(&*cart))
        };

        self.events.publish(StoreEvent::CartChanged {
            totals: snapshot.totals,
        });
        Ok((result, snapshot))
    }

    pub fn snapshot(&self) -> CartSnapshot {
        self.with_cart(|cart| CartSnapshot::from(cart))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Adds one unit of `product`, gated on its current stock.
    ///
    /// ## Errors
    /// - `STOCK_UNAVAILABLE` when the catalog reports nothing on hand
    /// - `STOCK_LIMIT_EXCEEDED` when the line already holds every unit
    /// - catalog errors from the stock check, unchanged
    pub async fn add_to_cart(&self, product: &Product) -> ApiResult<CartSnapshot> {
        debug!(product_id = %product.id, "add_to_cart");

        let level = self.catalog.check_stock(&product.id).await?;
        let stock = if level.in_stock { level.stock } else { 0 };

        let outcome = {
            let mut cart = self.lock();
            let outcome = cart.add_item(product, stock);
            if outcome.is_ok() {
                save_items(self.store.as_ref(), CART_KEY, cart.items());
            }
            outcome.map(|quantity| (quantity, CartSnapshot::from(&*cart)))
        };

        match outcome {
            Ok((quantity, snapshot)) => {
                info!(product_id = %product.id, quantity, "Added to cart");
                self.events.notice(Notice::AddedToCart {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                });
                self.events.publish(StoreEvent::CartChanged {
                    totals: snapshot.totals,
                });
                Ok(snapshot)
            }
            Err(err) => {
                match &err {
                    CoreError::StockUnavailable { product_id, name } => {
                        self.events.notice(Notice::OutOfStock {
                            product_id: product_id.clone(),
                            name: name.clone(),
                        })
                    }
                    CoreError::StockLimitExceeded {
                        product_id,
                        name,
                        stock,
                        ..
                    } => self.events.notice(Notice::StockLimitReached {
                        product_id: product_id.clone(),
                        name: name.clone(),
                        stock: *stock,
                    }),
                    _ => {}
                }
                debug!(product_id = %product.id, error = %err, "Add rejected by stock gate");
                Err(err.into())
            }
        }
    }

    /// Looks the product up in the catalog, then adds it.
    pub async fn add_product_by_id(&self, product_id: &str) -> ApiResult<CartSnapshot> {
        let product = self.catalog.get_product(product_id).await?;
        self.add_to_cart(&product).await
    }

    /// Removes a line. Unknown ids leave the cart as it was.
    pub fn remove_from_cart(&self, product_id: &str) -> CartSnapshot {
        debug!(product_id = %product_id, "remove_from_cart");
        let (removed, snapshot) = self.mutate(|cart| cart.remove_item(product_id));
        if removed {
            info!(product_id = %product_id, "Removed from cart");
        }
        snapshot
    }

    /// Sets a line's quantity. Zero or below removes the line. No stock check.
    ///
    /// ## Errors
    /// `VALIDATION_ERROR` for quantities past `MAX_LINE_QUANTITY`; the cart
    /// and its stored copy stay as they were.
    pub fn update_quantity(&self, product_id: &str, quantity: i64) -> ApiResult<CartSnapshot> {
        debug!(product_id = %product_id, quantity, "update_quantity");
        let (_, snapshot) = self.try_mutate(|cart| cart.update_quantity(product_id, quantity))?;
        Ok(snapshot)
    }

    pub fn clear_cart(&self) -> CartSnapshot {
        debug!("clear_cart");
        self.mutate(Cart::clear).1
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::persistence::MemoryStore;
    use crate::state::test_support::{drain, product, StubCatalog};
    use resham_core::Money;

    fn cart_store(catalog: Arc<StubCatalog>) -> (CartStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cart = CartStore::new(catalog, store.clone(), EventBus::new());
        (cart, store)
    }

    #[tokio::test]
    async fn test_repeated_adds_merge_into_one_line() {
        let p = product("p1", 100, 10);
        let catalog = StubCatalog::with(vec![p.clone()]);
        let (cart, _) = cart_store(catalog.clone());

        for _ in 0..4 {
            cart.add_to_cart(&p).await.unwrap();
        }

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].quantity, 4);
        assert_eq!(catalog.stock_checks(), 4);
    }

    #[tokio::test]
    async fn test_stock_gate_stops_at_available_units() {
        let p = product("p1", 100, 3);
        let catalog = StubCatalog::with(vec![p.clone()]);
        let (cart, _) = cart_store(catalog);
        let mut rx = cart.subscribe();

        for _ in 0..3 {
            cart.add_to_cart(&p).await.unwrap();
        }
        drain(&mut rx);

        let err = cart.add_to_cart(&p).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StockLimitExceeded);
        assert_eq!(cart.with_cart(|c| c.quantity_of("p1")), 3);

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![StoreEvent::Notice {
                notice: Notice::StockLimitReached {
                    product_id: "p1".into(),
                    name: p.name.clone(),
                    stock: 3,
                }
            }]
        );
    }

    #[tokio::test]
    async fn test_out_of_stock_add_changes_nothing() {
        let p = product("p2", 100, 0);
        let catalog = StubCatalog::with(vec![p.clone()]);
        let (cart, store) = cart_store(catalog);
        let mut rx = cart.subscribe();

        let err = cart.add_to_cart(&p).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StockUnavailable);
        assert!(cart.snapshot().items.is_empty());
        assert_eq!(store.read(CART_KEY).unwrap(), None);
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [StoreEvent::Notice {
                notice: Notice::OutOfStock { .. }
            }]
        ));
    }

    #[tokio::test]
    async fn test_stock_is_read_live_not_from_snapshot() {
        // Product snapshot claims plenty, catalog says one left
        let p = product("p1", 100, 50);
        let catalog = StubCatalog::with(vec![p.clone()]);
        catalog.set_stock("p1", 1);
        let (cart, _) = cart_store(catalog);

        cart.add_to_cart(&p).await.unwrap();
        let err = cart.add_to_cart(&p).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StockLimitExceeded);
    }

    #[tokio::test]
    async fn test_catalog_failure_leaves_cart_untouched() {
        let p = product("p1", 100, 5);
        let catalog = StubCatalog::with(vec![p.clone()]);
        catalog.set_unavailable(true);
        let (cart, _) = cart_store(catalog);

        let err = cart.add_to_cart(&p).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CatalogUnavailable);
        assert!(err.retryable);
        assert!(cart.snapshot().items.is_empty());
    }

    #[tokio::test]
    async fn test_add_unknown_product_by_id_is_not_found() {
        let (cart, _) = cart_store(StubCatalog::with(vec![]));
        let err = cart.add_product_by_id("missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_update_quantity_to_zero_removes_line() {
        let p = product("p1", 100, 5);
        let (cart, _) = cart_store(StubCatalog::with(vec![p.clone()]));
        cart.add_to_cart(&p).await.unwrap();

        let snapshot = cart.update_quantity("p1", 0).unwrap();
        assert!(snapshot.items.is_empty());

        cart.add_to_cart(&p).await.unwrap();
        assert!(cart.update_quantity("p1", -4).unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_skips_stock_check() {
        let p = product("p1", 100, 2);
        let catalog = StubCatalog::with(vec![p.clone()]);
        let (cart, _) = cart_store(catalog.clone());
        cart.add_to_cart(&p).await.unwrap();

        let snapshot = cart.update_quantity("p1", 9).unwrap();
        assert_eq!(snapshot.items[0].quantity, 9);
        assert_eq!(catalog.stock_checks(), 1);
    }

    #[tokio::test]
    async fn test_remove_nonexistent_is_noop() {
        let p = product("p1", 100, 5);
        let (cart, _) = cart_store(StubCatalog::with(vec![p.clone()]));
        cart.add_to_cart(&p).await.unwrap();
        let before = cart.snapshot();

        let after = cart.remove_from_cart("nonexistent");
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_totals_follow_lines() {
        let a = product("a", 100, 5);
        let b = product("b", 50, 5);
        let (cart, _) = cart_store(StubCatalog::with(vec![a.clone(), b.clone()]));

        cart.add_to_cart(&a).await.unwrap();
        cart.add_to_cart(&b).await.unwrap();
        cart.update_quantity("a", 2).unwrap();
        let snapshot = cart.update_quantity("b", 3).unwrap();

        assert_eq!(snapshot.totals.total, Money::from_minor(350));
        assert_eq!(snapshot.totals.item_count, 5);
        assert_eq!(snapshot.totals.line_count, 2);
    }

    #[tokio::test]
    async fn test_mutations_persist_and_rehydrate() {
        let p = product("p1", 100, 5);
        let catalog = StubCatalog::with(vec![p.clone()]);
        let (cart, store) = cart_store(catalog.clone());

        cart.add_to_cart(&p).await.unwrap();
        cart.add_to_cart(&p).await.unwrap();

        let reopened = CartStore::new(catalog, store.clone(), EventBus::new());
        assert_eq!(reopened.snapshot(), cart.snapshot());

        cart.clear_cart();
        let reopened = CartStore::new(StubCatalog::with(vec![]), store, EventBus::new());
        assert!(reopened.snapshot().items.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_quantity_is_rejected_before_persisting() {
        let p = product("p1", 100, 5);
        let (cart, store) = cart_store(StubCatalog::with(vec![p.clone()]));
        cart.add_to_cart(&p).await.unwrap();
        let mut rx = cart.subscribe();

        let err = cart.update_quantity("p1", i64::MAX / 2).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(drain(&mut rx).is_empty());

        let stored: Vec<CartItem> = load_items(store.as_ref(), CART_KEY);
        assert_eq!(stored[0].quantity, 1);

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.totals.total, Money::from_minor(100));
        assert_eq!(snapshot.items[0].quantity, 1);
    }
}
