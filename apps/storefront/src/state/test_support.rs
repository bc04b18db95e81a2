//! Test doubles shared by the state and command tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Notify};

use resham_core::error::CatalogResult;
use resham_core::{
    Catalog, CatalogError, CustomerContact, GatewayKind, GatewayStatus, Money, PaymentOrder,
    Product, StockLevel,
};
use resham_payments::{
    CallbackPayload, GatewayError, GatewayResult, PaymentGateway, RedirectTarget,
    VerifiedCallback,
};

use super::events::StoreEvent;

pub fn product(id: &str, price: i64, stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: id.to_string(),
        name: format!("Saree {}", id),
        slug: format!("saree-{}", id),
        description: None,
        price: Money::from_minor(price),
        stock,
        images: vec![format!("/images/{}.jpg", id)],
        category_id: Some("cat-banarasi".to_string()),
        fabric: Some("Katan silk".to_string()),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn contact() -> CustomerContact {
    CustomerContact {
        name: "Meera Iyer".to_string(),
        email: "meera@example.in".to_string(),
        phone: "9876543210".to_string(),
    }
}

/// Drains everything currently buffered on a receiver.
pub fn drain(rx: &mut broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Default)]
pub struct StubCatalog {
    products: Mutex<HashMap<String, Product>>,
    stock_checks: AtomicUsize,
    unavailable: Mutex<bool>,
}

impl StubCatalog {
    pub fn with(products: Vec<Product>) -> Arc<Self> {
        let catalog = StubCatalog::default();
        {
            let mut map = catalog.products.lock().unwrap();
            for p in products {
                map.insert(p.id.clone(), p);
            }
        }
        Arc::new(catalog)
    }

    pub fn set_stock(&self, id: &str, stock: i64) {
        if let Some(p) = self.products.lock().unwrap().get_mut(id) {
            p.stock = stock;
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    pub fn stock_checks(&self) -> usize {
        self.stock_checks.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> CatalogResult<()> {
        if *self.unavailable.lock().unwrap() {
            return Err(CatalogError::Unavailable("stub offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for StubCatalog {
    async fn get_products(&self, category: Option<&str>) -> CatalogResult<Vec<Product>> {
        self.check_available()?;
        let mut products: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .values()
            .filter(|p| category.map_or(true, |c| p.category_id.as_deref() == Some(c)))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn get_product(&self, id: &str) -> CatalogResult<Product> {
        self.check_available()?;
        self.products
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    async fn check_stock(&self, id: &str) -> CatalogResult<StockLevel> {
        self.stock_checks.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.products
            .lock()
            .unwrap()
            .get(id)
            .map(|p| StockLevel::from_stock(p.stock))
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// How the stub answers `initiate`.
#[derive(Debug, Clone)]
pub enum InitiateOutcome {
    Redirect(String),
    NetworkError,
    BadShape,
}

/// Scriptable gateway.
///
/// Callbacks are `CallbackPayload::Wallet` maps with `transactionId`,
/// `status` (`success` | `failure` | `pending`) and `sig`; only `sig = "ok"`
/// verifies.
pub struct StubGateway {
    kind: GatewayKind,
    outcome: Mutex<InitiateOutcome>,
    poll_status: Mutex<GatewayStatus>,
    pub initiated: Mutex<Vec<PaymentOrder>>,
    /// When set, `initiate` signals `entered` and waits for `release`.
    hold: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl StubGateway {
    pub fn new(kind: GatewayKind, outcome: InitiateOutcome) -> Self {
        StubGateway {
            kind,
            outcome: Mutex::new(outcome),
            poll_status: Mutex::new(GatewayStatus::Pending),
            initiated: Mutex::new(Vec::new()),
            hold: None,
        }
    }

    pub fn held(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.hold = Some((entered, release));
        self
    }

    pub fn set_outcome(&self, outcome: InitiateOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn set_poll_status(&self, status: GatewayStatus) {
        *self.poll_status.lock().unwrap() = status;
    }
}

pub fn callback(txn: &str, status: &str, sig: &str) -> CallbackPayload {
    CallbackPayload::Wallet(HashMap::from([
        ("transactionId".to_string(), txn.to_string()),
        ("status".to_string(), status.to_string()),
        ("sig".to_string(), sig.to_string()),
    ]))
}

#[async_trait]
impl PaymentGateway for StubGateway {
    fn kind(&self) -> GatewayKind {
        self.kind
    }

    async fn initiate(&self, order: &PaymentOrder) -> GatewayResult<RedirectTarget> {
        if let Some((entered, release)) = &self.hold {
            entered.notify_one();
            release.notified().await;
        }
        self.initiated.lock().unwrap().push(order.clone());

        let outcome = self.outcome.lock().unwrap().clone();
        match outcome {
            InitiateOutcome::Redirect(url) => Ok(RedirectTarget {
                url,
                gateway_reference: Some(format!("ref-{}", order.merchant_transaction_id)),
            }),
            InitiateOutcome::NetworkError => Err(GatewayError::Request("connection refused".into())),
            InitiateOutcome::BadShape => Err(GatewayError::ResponseShape("no redirect url".into())),
        }
    }

    fn verify_callback(&self, payload: &CallbackPayload) -> GatewayResult<VerifiedCallback> {
        let CallbackPayload::Wallet(fields) = payload else {
            return Err(GatewayError::InvalidCallback("wallet only".into()));
        };
        if fields.get("sig").map(String::as_str) != Some("ok") {
            return Err(GatewayError::CallbackVerification("bad signature".into()));
        }
        let status = match fields.get("status").map(String::as_str) {
            Some("success") => GatewayStatus::Success,
            Some("failure") => GatewayStatus::Failure,
            _ => GatewayStatus::Pending,
        };
        Ok(VerifiedCallback {
            merchant_transaction_id: fields.get("transactionId").cloned().unwrap_or_default(),
            status,
            gateway_reference: None,
            amount: fields
                .get("amount")
                .and_then(|a| a.parse().ok())
                .map(Money::from_minor),
        })
    }

    async fn fetch_status(
        &self,
        merchant_transaction_id: &str,
        _gateway_reference: Option<&str>,
    ) -> GatewayResult<VerifiedCallback> {
        Ok(VerifiedCallback {
            merchant_transaction_id: merchant_transaction_id.to_string(),
            status: *self.poll_status.lock().unwrap(),
            gateway_reference: None,
            amount: None,
        })
    }
}
