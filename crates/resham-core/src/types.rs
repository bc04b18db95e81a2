//! # Catalog Types
//!
//! Read-only catalog records as the storefront sees them.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Catalog Data Model                               │
//! │                                                                         │
//! │  ┌──────────────┐         ┌──────────────┐                              │
//! │  │   Category   │ 1     * │   Product    │                              │
//! │  │              │─────────│              │                              │
//! │  │  banarasi    │         │  price       │──► CartItem (snapshot)       │
//! │  │  kanjivaram  │         │  stock ≥ 0   │──► WishlistItem (snapshot)   │
//! │  │  chanderi    │         │  images[]    │                              │
//! │  └──────────────┘         └──────┬───────┘                              │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                           StockLevel { in_stock, stock }                │
//! │                           (the only field the cart gate reads)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::PLACEHOLDER_IMAGE;

// =============================================================================
// Product
// =============================================================================

/// A saree (or accessory) in the catalog.
///
/// The cart and wishlist only ever copy `id`, `name`, `price` and the first
/// image; `stock` is re-read from the catalog at add time rather than trusted
/// from this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,

    /// URL slug (e.g., "red-banarasi-katan-silk")
    pub slug: String,

    pub description: Option<String>,

    /// Price in paise
    pub price: Money,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Image URLs, first one is the primary
    pub images: Vec<String>,

    pub category_id: Option<String>,

    /// Weave/fabric (e.g., "Katan silk", "Tussar")
    pub fabric: Option<String>,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the primary image, or the placeholder when there is none.
    pub fn primary_image(&self) -> String {
        self.images
            .first()
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
    }

    /// Returns the stock level derived from this record.
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::from_stock(self.stock)
    }
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
}

// =============================================================================
// Stock Level
// =============================================================================

/// Answer to a stock check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockLevel {
    pub in_stock: bool,
    pub stock: i64,
}

impl StockLevel {
    pub fn from_stock(stock: i64) -> Self {
        let stock = stock.max(0);
        StockLevel {
            in_stock: stock > 0,
            stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_images(images: Vec<&str>) -> Product {
        Product {
            id: "p1".into(),
            name: "Mysore Silk".into(),
            slug: "mysore-silk".into(),
            description: None,
            price: Money::from_minor(900_000),
            stock: 2,
            images: images.into_iter().map(String::from).collect(),
            category_id: None,
            fabric: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_primary_image_falls_back_to_placeholder() {
        assert_eq!(product_with_images(vec![]).primary_image(), PLACEHOLDER_IMAGE);
        assert_eq!(
            product_with_images(vec!["/a.jpg", "/b.jpg"]).primary_image(),
            "/a.jpg"
        );
    }

    #[test]
    fn test_stock_level_clamps_negative() {
        let level = StockLevel::from_stock(-4);
        assert_eq!(level.stock, 0);
        assert!(!level.in_stock);
        assert!(StockLevel::from_stock(1).in_stock);
    }
}
