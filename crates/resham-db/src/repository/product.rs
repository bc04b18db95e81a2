//! # Product Repository
//!
//! Database operations for products, and the SQLite implementation of the
//! [`Catalog`] port.
//!
//! ## Stock Check Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Add-to-Cart Stock Check                              │
//! │                                                                         │
//! │  CartStore::add_to_cart(product)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Catalog::check_stock(id)  ← exactly one call per add                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT stock FROM products WHERE id = ? AND is_active = 1             │
//! │       │                                                                 │
//! │       ├── row    → StockLevel { in_stock: stock > 0, stock }           │
//! │       └── no row → CatalogError::NotFound                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use resham_core::error::CatalogResult;
use resham_core::{Catalog, CatalogError, Money, Product, StockLevel};

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.slug, p.description, p.price, p.stock, p.images, \
     p.category_id, p.fabric, p.is_active, p.created_at, p.updated_at";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    slug: String,
    description: Option<String>,
    price: i64,
    stock: i64,
    images: String,
    category_id: Option<String>,
    fabric: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let images = serde_json::from_str::<Vec<String>>(&row.images).unwrap_or_else(|e| {
            warn!(id = %row.id, error = %e, "Unreadable images column, treating as empty");
            Vec::new()
        });

        Product {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: Money::from_minor(row.price),
            stock: row.stock,
            images,
            category_id: row.category_id,
            fabric: row.fabric,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn encode_images(images: &[String]) -> DbResult<String> {
    serde_json::to_string(images).map_err(|e| DbError::Internal(e.to_string()))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let sarees = repo.list_active(Some("banarasi")).await?;
/// let level = repo.stock_level("sr-001").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products ordered by name.
    ///
    /// `category` matches either the category id or its slug.
    pub async fn list_active(&self, category: Option<&str>) -> DbResult<Vec<Product>> {
        debug!(category = ?category, "Listing products");

        let rows = match category {
            Some(category) => {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products p \
                     LEFT JOIN categories c ON c.id = p.category_id \
                     WHERE p.is_active = 1 AND (p.category_id = ?1 OR c.slug = ?1) \
                     ORDER BY p.name"
                );
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(category)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.is_active = 1 ORDER BY p.name"
                );
                sqlx::query_as::<_, ProductRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        debug!(count = rows.len(), "Listed products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by id, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Gets an active product by its URL slug.
    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.slug = ?1 AND p.is_active = 1"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Stock for an active product. Inactive or missing ids are `NotFound`.
    pub async fn stock_level(&self, id: &str) -> DbResult<StockLevel> {
        let stock: Option<i64> =
            sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1 AND is_active = 1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        stock
            .map(StockLevel::from_stock)
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - slug already exists
    /// * `Err(DbError::ForeignKeyViolation)` - unknown category
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(slug = %product.slug, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, slug, description, price, stock, images,
                category_id, fabric, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price.minor_units())
        .bind(product.stock)
        .bind(encode_images(&product.images)?)
        .bind(&product.category_id)
        .bind(&product.fabric)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product's descriptive fields, price and stock.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                slug = ?3,
                description = ?4,
                price = ?5,
                stock = ?6,
                images = ?7,
                category_id = ?8,
                fabric = ?9,
                is_active = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price.minor_units())
        .bind(product.stock)
        .bind(encode_images(&product.images)?)
        .bind(&product.category_id)
        .bind(&product.fabric)
        .bind(product.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Adjusts stock by a delta (negative after a sale, positive on restock).
    ///
    /// Going below zero violates the `stock >= 0` check and returns
    /// `DbError::CheckViolation` without changing anything.
    pub async fn update_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Updating stock");

        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Hides a product from the storefront by setting `is_active = 0`.
    ///
    /// Carts and wishlists may still hold it; the next add-to-cart reports
    /// it as not found.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Catalog Port
// =============================================================================

#[async_trait]
impl Catalog for ProductRepository {
    async fn get_products(&self, category: Option<&str>) -> CatalogResult<Vec<Product>> {
        Ok(self.list_active(category).await?)
    }

    async fn get_product(&self, id: &str) -> CatalogResult<Product> {
        match self.get_by_id(id).await? {
            Some(product) if product.is_active => Ok(product),
            _ => Err(CatalogError::NotFound(id.to_string())),
        }
    }

    async fn check_stock(&self, id: &str) -> CatalogResult<StockLevel> {
        Ok(self.stock_level(id).await?)
    }
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
