//! # HTTP Server
//!
//! JSON routes for the web front end plus the gateways' callback endpoints.
//! Handlers only extract and delegate to [`commands`](crate::commands).
//!
//! ## Routes
//! ```text
//! GET    /health                                   "OK"
//! GET    /api/products?category=                   list_products
//! GET    /api/products/{id}                        get_product
//! GET    /api/cart                                 get_cart
//! DELETE /api/cart                                 clear_cart
//! POST   /api/cart/items            {productId}    add_to_cart
//! PUT    /api/cart/items/{id}       {quantity}     update_cart_item
//! DELETE /api/cart/items/{id}                      remove_from_cart
//! GET    /api/wishlist                             get_wishlist
//! DELETE /api/wishlist                             clear_wishlist
//! POST   /api/wishlist/items        {productId}    add_to_wishlist
//! DELETE /api/wishlist/items/{id}                  remove_from_wishlist
//! POST   /api/wishlist/items/{id}/move-to-cart     move_to_cart
//! GET    /api/checkout/gateways                    list_gateways
//! POST   /api/checkout              {gateway,contact} initiate_checkout
//! POST   /api/checkout/{txn}/redirected            confirm_redirect
//! GET    /api/checkout/{txn}/status                checkout_status
//! POST   /api/checkout/callback/wallet  (form)     wallet_callback
//! POST   /api/checkout/callback/card    (raw)      card_webhook
//! ```

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post, put},
    Form, Json, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use resham_core::{CheckoutTransaction, GatewayKind};

use crate::commands::catalog::ProductDto;
use crate::commands::checkout::InitiateCheckoutRequest;
use crate::commands::wishlist::WishlistResponse;
use crate::commands::{cart, catalog, checkout, wishlist};
use crate::commands::cart::{AddItemRequest, UpdateQuantityRequest};
use crate::error::ApiResult;
use crate::state::{AppState, CartSnapshot};

/// Header carrying the card network's webhook signature.
pub const CARD_SIGNATURE_HEADER: &str = "stripe-signature";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/cart", get(get_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_to_cart))
        .route(
            "/api/cart/items/{id}",
            put(update_cart_item).delete(remove_from_cart),
        )
        .route("/api/wishlist", get(get_wishlist).delete(clear_wishlist))
        .route("/api/wishlist/items", post(add_to_wishlist))
        .route("/api/wishlist/items/{id}", axum::routing::delete(remove_from_wishlist))
        .route("/api/wishlist/items/{id}/move-to-cart", post(move_to_cart))
        .route("/api/checkout", post(initiate_checkout))
        .route("/api/checkout/gateways", get(list_gateways))
        .route("/api/checkout/{txn}/redirected", post(confirm_redirect))
        .route("/api/checkout/{txn}/status", get(checkout_status))
        .route("/api/checkout/callback/wallet", post(wallet_callback))
        .route("/api/checkout/callback/card", post(card_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `bind_addr` and serves until `shutdown` resolves.
pub async fn serve<F>(state: AppState, bind_addr: &str, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "Storefront listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Storefront shutting down");
        })
        .await
}

/// Health check endpoint.
async fn health_handler() -> impl IntoResponse {
    "OK"
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Deserialize)]
struct ProductQuery {
    category: Option<String>,
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<ProductDto>>> {
    catalog::list_products(&state, query.category.as_deref())
        .await
        .map(Json)
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductDto>> {
    catalog::get_product(&state, &id).await.map(Json)
}

// =============================================================================
// Cart
// =============================================================================

async fn get_cart(State(state): State<AppState>) -> Json<CartSnapshot> {
    Json(cart::get_cart(&state))
}

async fn add_to_cart(
    State(state): State<AppState>,
    Json(body): Json<AddItemRequest>,
) -> ApiResult<Json<CartSnapshot>> {
    cart::add_to_cart(&state, &body.product_id).await.map(Json)
}

async fn update_cart_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateQuantityRequest>,
) -> ApiResult<Json<CartSnapshot>> {
    cart::update_cart_item(&state, &id, body.quantity).map(Json)
}

async fn remove_from_cart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<CartSnapshot> {
    Json(cart::remove_from_cart(&state, &id))
}

async fn clear_cart(State(state): State<AppState>) -> Json<CartSnapshot> {
    Json(cart::clear_cart(&state))
}

// =============================================================================
// Wishlist
// =============================================================================

async fn get_wishlist(State(state): State<AppState>) -> Json<WishlistResponse> {
    Json(wishlist::get_wishlist(&state))
}

async fn add_to_wishlist(
    State(state): State<AppState>,
    Json(body): Json<AddItemRequest>,
) -> ApiResult<Json<WishlistResponse>> {
    wishlist::add_to_wishlist(&state, &body.product_id)
        .await
        .map(Json)
}

async fn remove_from_wishlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<WishlistResponse> {
    Json(wishlist::remove_from_wishlist(&state, &id))
}

async fn clear_wishlist(State(state): State<AppState>) -> Json<WishlistResponse> {
    Json(wishlist::clear_wishlist(&state))
}

async fn move_to_cart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CartSnapshot>> {
    wishlist::move_to_cart(&state, &id).await.map(Json)
}

// =============================================================================
// Checkout
// =============================================================================

async fn list_gateways(State(state): State<AppState>) -> Json<Vec<GatewayKind>> {
    Json(checkout::list_gateways(&state))
}

async fn initiate_checkout(
    State(state): State<AppState>,
    Json(body): Json<InitiateCheckoutRequest>,
) -> ApiResult<Json<CheckoutTransaction>> {
    checkout::initiate_checkout(&state, body).await.map(Json)
}

async fn confirm_redirect(
    State(state): State<AppState>,
    Path(txn): Path<String>,
) -> ApiResult<Json<CheckoutTransaction>> {
    checkout::confirm_redirect(&state, &txn).map(Json)
}

async fn checkout_status(
    State(state): State<AppState>,
    Path(txn): Path<String>,
) -> ApiResult<Json<CheckoutTransaction>> {
    checkout::checkout_status(&state, &txn).await.map(Json)
}

async fn wallet_callback(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> ApiResult<Json<CheckoutTransaction>> {
    checkout::wallet_callback(&state, fields).await.map(Json)
}

async fn card_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<Json<CheckoutTransaction>> {
    let signature = headers
        .get(CARD_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    checkout::card_webhook(&state, body, signature).await.map(Json)
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_state;
    use crate::state::test_support::product;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = test_state(vec![]);
        let response = router(state)
            .oneshot(empty_request("GET", "/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_add_to_cart_and_stock_limit_over_http() {
        let (state, _) = test_state(vec![product("p1", 100, 1)]);
        let app = router(state);

        let (status, body) = send(
            &app,
            json_request("POST", "/api/cart/items", serde_json::json!({"productId": "p1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totals"]["itemCount"], 1);
        assert_eq!(body["items"][0]["id"], "p1");

        let (status, body) = send(
            &app,
            json_request("POST", "/api/cart/items", serde_json::json!({"productId": "p1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "STOCK_LIMIT_EXCEEDED");

        let (status, body) = send(
            &app,
            json_request("PUT", "/api/cart/items/p1", serde_json::json!({"quantity": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_oversized_quantity_is_400_and_cart_still_reads() {
        let (state, _) = test_state(vec![product("p1", 100, 5)]);
        let app = router(state);

        send(
            &app,
            json_request("POST", "/api/cart/items", serde_json::json!({"productId": "p1"})),
        )
        .await;

        let (status, body) = send(
            &app,
            json_request(
                "PUT",
                "/api/cart/items/p1",
                serde_json::json!({"quantity": 4_611_686_018_427_387_903_i64}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = send(&app, empty_request("GET", "/api/cart")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"][0]["quantity"], 1);
        assert_eq!(body["totals"]["total"], 100);
    }

    #[tokio::test]
    async fn test_unknown_product_is_404() {
        let (state, _) = test_state(vec![]);
        let (status, body) = send(&router(state), empty_request("GET", "/api/products/ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_checkout_and_wallet_callback_over_http() {
        let (state, _) = test_state(vec![product("p1", 250_000, 2)]);
        let app = router(state);

        send(
            &app,
            json_request("POST", "/api/cart/items", serde_json::json!({"productId": "p1"})),
        )
        .await;

        let (status, txn) = send(
            &app,
            json_request(
                "POST",
                "/api/checkout",
                serde_json::json!({
                    "gateway": "regional_wallet",
                    "contact": {"name": "Meera Iyer", "email": "meera@example.in", "phone": "9876543210"}
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(txn["phase"], "awaiting_gateway_redirect");
        let id = txn["merchantTransactionId"].as_str().unwrap().to_string();

        // Forged callback is refused and changes nothing
        let forged = Request::builder()
            .method("POST")
            .uri("/api/checkout/callback/wallet")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(format!("transactionId={}&status=success&sig=bad", id)))
            .unwrap();
        let (status, _) = send(&app, forged).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, cart) = send(&app, empty_request("GET", "/api/cart")).await;
        assert_eq!(cart["totals"]["itemCount"], 1);

        let genuine = Request::builder()
            .method("POST")
            .uri("/api/checkout/callback/wallet")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(format!("transactionId={}&status=success&sig=ok", id)))
            .unwrap();
        let (status, done) = send(&app, genuine).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["phase"], "succeeded");

        let (_, cart) = send(&app, empty_request("GET", "/api/cart")).await;
        assert_eq!(cart["items"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_is_422() {
        let (state, _) = test_state(vec![]);
        let (status, body) = send(
            &router(state),
            json_request(
                "POST",
                "/api/checkout",
                serde_json::json!({
                    "gateway": "regional_wallet",
                    "contact": {"name": "Meera Iyer", "email": "meera@example.in", "phone": "9876543210"}
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "EMPTY_CART");
    }
}
