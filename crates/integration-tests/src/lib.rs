//! Integration tests for the marketplace cart engine.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketplace-integration-tests
//!
//! # With engine logs
//! RUST_LOG=marketplace_cart=debug cargo test -p marketplace-integration-tests -- --nocapture
//! ```
//!
//! # Test Categories
//!
//! - `cart_properties` - No lost updates, decrement floor, no-op mutations
//! - `cart_scenarios` - End-to-end cart flows, including storage outages
//! - `cart_persistence` - Snapshot round trips, malformed data, write supersession
//!
//! This library holds the fixtures those test files share.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use marketplace_cart::{KeyValueStorage, MemoryStorage, StorageError, codec};
use marketplace_core::{CartItem, Price, ProductRef};

/// Storage key used with the default configuration.
pub const DEFAULT_KEY: &str = "@GoMarketplace:products";

/// Install a test-friendly tracing subscriber once per test binary.
///
/// Honours `RUST_LOG`; defaults to warnings only.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketplace_cart=warn".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A catalog product priced in cents.
#[must_use]
pub fn product(id: &str, title: &str, cents: u32) -> ProductRef {
    ProductRef::new(
        id,
        title,
        format!("https://cdn.example.com/{id}.png"),
        Price::from_cents(cents),
    )
}

/// `(id, quantity)` pairs in cart order.
#[must_use]
pub fn lines(items: &[CartItem]) -> Vec<(String, u32)> {
    items
        .iter()
        .map(|item| (item.id.to_string(), item.quantity.get()))
        .collect()
}

/// Storage double that can be switched offline and slowed down, and that
/// records every successful write.
#[derive(Debug, Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_delay: Option<Duration>,
    writes: Mutex<Vec<String>>,
}

impl FlakyStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write sleeps for `delay` before landing.
    #[must_use]
    pub fn with_write_delay(delay: Duration) -> Self {
        Self {
            write_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_reads_failing(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    pub fn set_writes_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// Payloads of all successful writes, oldest first.
    pub fn writes(&self) -> Vec<String> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Decoded contents of the last successful write.
    pub async fn stored_items(&self, key: &str) -> Option<Vec<CartItem>> {
        let raw = self.inner.get(key).await.unwrap()?;
        Some(codec::decode(&raw).unwrap())
    }
}

impl KeyValueStorage for FlakyStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable("medium unreachable"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable("write rejected"));
        }
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value.clone());
        self.inner.set(key, value).await
    }
}
