//! # Cart
//!
//! The pure shopping cart: an ordered list of lines, one per product id.
//!
//! ## Add-to-Cart Stock Gate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    add_item(product, stock)                             │
//! │                                                                         │
//! │   stock ≤ 0 ? ──yes──► StockUnavailable         (no change)            │
//! │       │                                                                 │
//! │       no                                                                │
//! │       ▼                                                                 │
//! │   line for product.id exists?                                           │
//! │       │                                                                 │
//! │       ├─yes─► quantity + 1 > stock ? ──yes──► StockLimitExceeded       │
//! │       │              │                         (no change)              │
//! │       │              no                                                 │
//! │       │              ▼                                                  │
//! │       │         quantity += 1                                           │
//! │       │                                                                 │
//! │       └─no──► push CartItem { quantity: 1 }                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `stock` is whatever the catalog said a moment ago. The cart does not hold
//! reservations, so two shoppers racing for the last saree can both succeed
//! here; stock is settled by the payment and fulfilment side.
//!
//! ## Invariants
//! - At most one line per product id
//! - Every line has `1 <= quantity <= MAX_LINE_QUANTITY` (a line driven to
//!   0 is removed)
//! - The total always fits in an `i64` of paise
//! - Totals are derived on every read, never stored

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Product;

/// Largest quantity a single line may hold.
pub const MAX_LINE_QUANTITY: i64 = 999;

fn quantity_out_of_range() -> CoreError {
    ValidationError::OutOfRange {
        field: "quantity".to_string(),
        min: 0,
        max: MAX_LINE_QUANTITY,
    }
    .into()
}

fn total_out_of_range() -> CoreError {
    ValidationError::OutOfRange {
        field: "cart total".to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Cart Item
// =============================================================================

/// One line in the cart. This is also the persisted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub image: String,
    pub quantity: i64,
}

impl CartItem {
    /// Snapshots a product into a fresh line with quantity 1.
    pub fn from_product(product: &Product) -> Self {
        CartItem {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.primary_image(),
            quantity: 1,
        }
    }

    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Rebuilds a cart from persisted lines.
    ///
    /// Lines with a quantity outside `1..=MAX_LINE_QUANTITY` are dropped,
    /// as is any line that would push the total past `i64`. Only the first
    /// line per id is kept.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Cart::new();
        let mut total = Money::zero();
        for item in items {
            if !(1..=MAX_LINE_QUANTITY).contains(&item.quantity) || cart.contains(&item.id) {
                continue;
            }
            let next = item
                .price
                .checked_multiply_quantity(item.quantity)
                .and_then(|line| total.checked_add(line));
            let Some(next) = next else {
                continue;
            };
            total = next;
            cart.items.push(item);
        }
        cart
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.items.iter().any(|i| i.id == product_id)
    }

    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.items
            .iter()
            .find(|i| i.id == product_id)
            .map(|i| i.quantity)
            .unwrap_or(0)
    }

    /// Adds one unit of `product`, gated on `stock` units being available.
    ///
    /// ## Returns
    /// The line's quantity after the add.
    pub fn add_item(&mut self, product: &Product, stock: i64) -> CoreResult<i64> {
        if stock <= 0 {
            return Err(CoreError::StockUnavailable {
                product_id: product.id.clone(),
                name: product.name.clone(),
            });
        }

        if self
            .checked_total()
            .and_then(|total| total.checked_add(product.price))
            .is_none()
        {
            return Err(total_out_of_range());
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.id == product.id) {
            let requested = item.quantity + 1;
            if requested > MAX_LINE_QUANTITY {
                return Err(quantity_out_of_range());
            }
            if requested > stock {
                return Err(CoreError::StockLimitExceeded {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    stock,
                    requested,
                });
            }
            item.quantity = requested;
            return Ok(requested);
        }

        self.items.push(CartItem::from_product(product));
        Ok(1)
    }

    /// Sets a line's quantity, clamped at zero. Lines at zero are removed in
    /// the same call. Unknown ids are ignored.
    ///
    /// No stock check happens here; only add-to-cart is gated.
    ///
    /// ## Returns
    /// `true` if a line with that id existed.
    ///
    /// ## Errors
    /// `Validation` when `quantity` exceeds [`MAX_LINE_QUANTITY`] or the new
    /// total would not fit in an `i64`. The cart is left unchanged.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<bool> {
        let quantity = quantity.max(0);
        if quantity > MAX_LINE_QUANTITY {
            return Err(quantity_out_of_range());
        }

        let Some(index) = self.items.iter().position(|i| i.id == product_id) else {
            return Ok(false);
        };

        let previous = self.items[index].quantity;
        self.items[index].quantity = quantity;
        if self.checked_total().is_none() {
            self.items[index].quantity = previous;
            return Err(total_out_of_range());
        }
        self.items.retain(|i| i.quantity > 0);

        Ok(true)
    }

    /// Removes a line. Removing an absent id is a no-op.
    ///
    /// ## Returns
    /// `true` if a line was removed.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != product_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities across all lines (the badge number).
    pub fn count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of `price × quantity` across all lines.
    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Like [`total`](Self::total), `None` if the sum overflows.
    pub fn checked_total(&self) -> Option<Money> {
        self.items.iter().try_fold(Money::zero(), |acc, item| {
            acc.checked_add(item.price.checked_multiply_quantity(item.quantity)?)
        })
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }

    /// Consumes the cart, returning its lines for persistence.
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Cart totals summary for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub item_count: i64,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            item_count: cart.count(),
            total: cart.total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
