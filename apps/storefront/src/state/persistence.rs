//! # Client Store
//!
//! Keyed persistence for the shopper's cart, wishlist and in-flight checkout.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Client Store Contract                               │
//! │                                                                         │
//! │  load_items(key)                                                        │
//! │    ├── absent           → []                                            │
//! │    ├── valid JSON array → items                                         │
//! │    └── anything else    → [] + warn!   (never an error to the caller)   │
//! │                                                                         │
//! │  save_items(key, items)                                                 │
//! │    └── full overwrite; failure → error! and carry on                    │
//! │                                                                         │
//! │  Keys                                                                   │
//! │    resham.cart       JSON array of CartItem                             │
//! │    resham.wishlist   JSON array of WishlistItem                         │
//! │    resham.checkout   latest CheckoutTransaction (removed on success)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No locking and no versioning: the last write wins.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, warn};

use resham_core::error::StoreResult;
use resham_core::ClientStore;

pub const CART_KEY: &str = "resham.cart";
pub const WISHLIST_KEY: &str = "resham.wishlist";
pub const CHECKOUT_KEY: &str = "resham.checkout";

// =============================================================================
// Memory Store
// =============================================================================

/// Process-local store for tests and `backend = "memory"`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ClientStore for MemoryStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

// =============================================================================
// File Store
// =============================================================================

/// One JSON file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates if needed) a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "File store ready");
        Ok(FileStore { dir })
    }

    /// Platform data directory for shopper state.
    ///
    /// - **Linux**: `~/.local/share/resham-storefront/client`
    /// - **macOS**: `~/Library/Application Support/com.resham.storefront/client`
    pub fn default_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "resham", "storefront")
            .map(|dirs| dirs.data_dir().join("client"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl ClientStore for FileStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Typed Helpers
// =============================================================================

/// Loads a JSON array. Absent or unreadable data is an empty list.
pub fn load_items<T: DeserializeOwned>(store: &dyn ClientStore, key: &str) -> Vec<T> {
    load_value::<Vec<T>>(store, key).unwrap_or_default()
}

/// Overwrites `key` with `items`. Failures are logged, never returned.
pub fn save_items<T: Serialize>(store: &dyn ClientStore, key: &str, items: &[T]) {
    save_value(store, key, &items);
}

/// Loads a single JSON value. Absent or unreadable data is `None`.
pub fn load_value<T: DeserializeOwned>(store: &dyn ClientStore, key: &str) -> Option<T> {
    let raw = match store.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key = %key, error = %e, "Could not read persisted state, starting empty");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key = %key, error = %e, "Malformed persisted state, starting empty");
            None
        }
    }
}

pub fn save_value<T: Serialize + ?Sized>(store: &dyn ClientStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(resham_core::StoreError::from)
        .and_then(|json| store.write(key, &json));

    if let Err(e) = result {
        error!(key = %key, error = %e, "Failed to persist state");
    }
}

pub fn remove_value(store: &dyn ClientStore, key: &str) {
    if let Err(e) = store.remove(key) {
        error!(key = %key, error = %e, "Failed to remove persisted state");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use resham_core::{CartItem, Money};

    fn item(id: &str, quantity: i64) -> CartItem {
        CartItem {
            id: id.to_string(),
            name: format!("Saree {}", id),
            price: Money::from_minor(100),
            image: "/images/placeholder.jpg".to_string(),
            quantity,
        }
    }

    #[test]
    fn test_round_trip_through_fresh_file_store() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileStore::new(dir.path()).unwrap();
        save_items(&store, CART_KEY, &[item("a", 2)]);

        let reopened = FileStore::new(dir.path()).unwrap();
        let loaded: Vec<CartItem> = load_items(&reopened, CART_KEY);
        assert_eq!(loaded, vec![item("a", 2)]);
    }

    #[test]
    fn test_absent_key_loads_empty() {
        let store = MemoryStore::new();
        let loaded: Vec<CartItem> = load_items(&store, CART_KEY);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_malformed_data_loads_empty() {
        let store = MemoryStore::new();
        store.write(CART_KEY, "{not json").unwrap();
        assert!(load_items::<CartItem>(&store, CART_KEY).is_empty());

        // Valid JSON, wrong shape
        store.write(CART_KEY, r#"{"id":"a"}"#).unwrap();
        assert!(load_items::<CartItem>(&store, CART_KEY).is_empty());
    }

    #[test]
    fn test_save_is_full_overwrite() {
        let store = MemoryStore::new();
        save_items(&store, WISHLIST_KEY, &[item("a", 1), item("b", 1)]);
        save_items(&store, WISHLIST_KEY, &[item("c", 1)]);

        let loaded: Vec<CartItem> = load_items(&store, WISHLIST_KEY);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "c");
    }

    #[test]
    fn test_file_store_sanitizes_keys_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.write("../escape/key", "[]").unwrap();
        assert!(dir.path().join(".._escape_key.json").exists());

        store.remove("../escape/key").unwrap();
        store.remove("../escape/key").unwrap();
        assert_eq!(store.read("../escape/key").unwrap(), None);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("gone")).unwrap();
        std::fs::remove_dir_all(store.dir()).unwrap();

        // Must not panic
        save_items(&store, CART_KEY, &[item("a", 1)]);
        assert!(load_items::<CartItem>(&store, CART_KEY).is_empty());
    }
}
