//! # Catalog Commands
//!
//! Read-only product access for the listing and detail pages.

use serde::Serialize;
use tracing::debug;

use resham_core::validation::validate_id;
use resham_core::{Money, Product};

use crate::error::ApiResult;
use crate::state::AppState;

/// Product as shown to shoppers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Money,
    /// First image, or the placeholder
    pub image: String,
    pub images: Vec<String>,
    pub category_id: Option<String>,
    pub fabric: Option<String>,
    pub stock: i64,
    pub in_stock: bool,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        let image = p.primary_image();
        let level = p.stock_level();
        ProductDto {
            id: p.id,
            name: p.name,
            slug: p.slug,
            description: p.description,
            price: p.price,
            image,
            images: p.images,
            category_id: p.category_id,
            fabric: p.fabric,
            stock: level.stock,
            in_stock: level.in_stock,
        }
    }
}

/// Lists active products, optionally for one category (id or slug).
pub async fn list_products(state: &AppState, category: Option<&str>) -> ApiResult<Vec<ProductDto>> {
    let category = category.map(str::trim).filter(|c| !c.is_empty());
    debug!(category = ?category, "list_products command");

    let products = state.catalog.get_products(category).await?;
    Ok(products.into_iter().map(ProductDto::from).collect())
}

pub async fn get_product(state: &AppState, product_id: &str) -> ApiResult<ProductDto> {
    debug!(product_id = %product_id, "get_product command");
    validate_id("productId", product_id)?;

    let product = state.catalog.get_product(product_id).await?;
    Ok(product.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_state;
    use crate::error::ErrorCode;
    use crate::state::test_support::product;

    #[tokio::test]
    async fn test_list_and_filter() {
        let mut other = product("p3", 500, 1);
        other.category_id = Some("cat-kanjivaram".into());
        let (state, _) = test_state(vec![product("p1", 100, 2), product("p2", 200, 0), other]);

        assert_eq!(list_products(&state, None).await.unwrap().len(), 3);

        let filtered = list_products(&state, Some("cat-kanjivaram")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "p3");

        // Blank filter means no filter
        assert_eq!(list_products(&state, Some("  ")).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_get_product_dto() {
        let (state, _) = test_state(vec![product("p2", 200, 0)]);

        let dto = get_product(&state, "p2").await.unwrap();
        assert!(!dto.in_stock);
        assert_eq!(dto.image, "/images/p2.jpg");

        let err = get_product(&state, "nope").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = get_product(&state, "").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
