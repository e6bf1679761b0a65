//! Durability of the cart across restarts.

use std::sync::Arc;
use std::time::Duration;

use marketplace_cart::{
    CartConfig, CartService, FileStorage, KeyValueStorage, MemoryStorage, StorageBackend, codec,
};
use marketplace_core::{Price, ProductRef};
use marketplace_integration_tests::{DEFAULT_KEY, FlakyStorage, init_tracing, lines, product};
use rust_decimal::Decimal;

// =============================================================================
// Round Trips
// =============================================================================

#[tokio::test]
async fn test_restart_restores_identical_cart() {
    init_tracing();
    let storage = MemoryStorage::new();

    let cart = CartService::start(storage.clone(), &CartConfig::default()).await;
    cart.add_item(product("2", "Mug", 550)).await.unwrap();
    cart.add_item(product("1", "Shirt", 1999)).await.unwrap();
    cart.add_item(product("2", "Mug", 550)).await.unwrap();
    cart.shutdown().await.unwrap();
    let before = cart.current_items().to_vec();

    let restarted = CartService::start(storage, &CartConfig::default()).await;
    assert_eq!(restarted.current_items().to_vec(), before);
    assert_eq!(
        lines(&restarted.current_items()),
        [("2".to_string(), 2), ("1".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_restart_preserves_exact_prices() {
    init_tracing();
    let storage = MemoryStorage::new();
    let amounts = ["12345678901234.5678", "0.125", "19.999"];

    let cart = CartService::start(storage.clone(), &CartConfig::default()).await;
    for (i, amount) in amounts.iter().enumerate() {
        let price = Price::new(amount.parse::<Decimal>().unwrap()).unwrap();
        let product = ProductRef::new(i.to_string(), "Bulk", "https://img/bulk.png", price);
        cart.add_item(product).await.unwrap();
    }
    cart.shutdown().await.unwrap();
    let before = cart.current_items().to_vec();

    let restarted = CartService::start(storage, &CartConfig::default()).await;
    let after = restarted.current_items().to_vec();
    assert_eq!(after, before);

    let prices: Vec<String> = after.iter().map(|item| item.price.to_string()).collect();
    assert_eq!(prices, amounts);
}

#[tokio::test]
async fn test_file_storage_survives_restart() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = CartConfig {
        namespace: "@Shop".to_string(),
        storage_dir: Some(dir.path().to_path_buf()),
    };

    let cart = CartService::start(config.open_storage(), &config).await;
    cart.add_item(product("1", "Shirt", 1000)).await.unwrap();
    cart.increment_item("1").await.unwrap();
    cart.shutdown().await.unwrap();

    let file = FileStorage::new(dir.path()).path_for("@Shop:products");
    assert!(file.exists());

    let restarted = CartService::start(config.open_storage(), &config).await;
    assert_eq!(lines(&restarted.current_items()), [("1".to_string(), 2)]);
}

#[tokio::test]
async fn test_namespace_isolates_carts() {
    init_tracing();
    let storage = MemoryStorage::new();
    let shop_a = CartConfig {
        namespace: "@A".to_string(),
        ..CartConfig::default()
    };
    let shop_b = CartConfig {
        namespace: "@B".to_string(),
        ..CartConfig::default()
    };

    let cart = CartService::start(storage.clone(), &shop_a).await;
    cart.add_item(product("1", "Shirt", 1000)).await.unwrap();
    cart.shutdown().await.unwrap();

    let other = CartService::start(storage.clone(), &shop_b).await;
    assert!(other.current_items().is_empty());
    assert!(storage.get("@A:products").await.unwrap().is_some());
    assert!(storage.get("@B:products").await.unwrap().is_none());
}

// =============================================================================
// Unreadable Snapshots
// =============================================================================

#[tokio::test]
async fn test_malformed_snapshot_starts_empty_and_is_replaced() {
    init_tracing();
    let storage = MemoryStorage::with_entry(DEFAULT_KEY, "{\"this\": is not json");

    let cart = CartService::start(storage.clone(), &CartConfig::default()).await;
    assert!(cart.current_items().is_empty());

    cart.add_item(product("1", "Shirt", 1000)).await.unwrap();
    cart.flush().await.unwrap();

    let raw = storage.get(DEFAULT_KEY).await.unwrap().unwrap();
    assert_eq!(lines(&codec::decode(&raw).unwrap()), [("1".to_string(), 1)]);
}

#[tokio::test]
async fn test_snapshot_with_zero_quantity_is_discarded() {
    init_tracing();
    let raw = serde_json::json!([
        {"id": "1", "title": "Shirt", "image_url": "u", "price": 10, "quantity": 0}
    ])
    .to_string();
    let storage = MemoryStorage::with_entry(DEFAULT_KEY, raw);

    let cart = CartService::start(storage, &CartConfig::default()).await;
    assert!(cart.current_items().is_empty());
}

#[tokio::test]
async fn test_unreachable_storage_at_startup_starts_empty() {
    init_tracing();
    let storage = Arc::new(FlakyStorage::new());
    storage.set_reads_failing(true);

    let cart = CartService::start(Arc::clone(&storage), &CartConfig::default()).await;
    assert!(cart.current_items().is_empty());

    let state = cart.add_item(product("1", "Shirt", 1000)).await.unwrap();
    assert_eq!(state.version(), 1);
}

// =============================================================================
// Write Ordering
// =============================================================================

#[tokio::test]
async fn test_slow_storage_only_persists_newer_states() {
    init_tracing();
    let storage = Arc::new(FlakyStorage::with_write_delay(Duration::from_millis(20)));
    let cart = CartService::start(Arc::clone(&storage), &CartConfig::default()).await;

    for _ in 0..10 {
        cart.add_item(product("x", "Widget", 100)).await.unwrap();
    }
    cart.flush().await.unwrap();

    let writes = storage.writes();
    assert!(!writes.is_empty());
    assert!(writes.len() < 10, "superseded states should be skipped");

    let persisted: Vec<u32> = writes
        .iter()
        .map(|raw| codec::decode(raw).unwrap()[0].quantity.get())
        .collect();
    assert!(
        persisted.windows(2).all(|pair| pair[0] < pair[1]),
        "writes went backwards: {persisted:?}"
    );
    assert_eq!(persisted.last(), Some(&10));
}

#[tokio::test]
async fn test_flush_waits_for_in_flight_write() {
    init_tracing();
    let storage = Arc::new(FlakyStorage::with_write_delay(Duration::from_millis(30)));
    let cart = CartService::start(Arc::clone(&storage), &CartConfig::default()).await;

    cart.add_item(product("1", "Shirt", 1000)).await.unwrap();
    assert_eq!(cart.persist_status().persisted_version, 0);

    cart.flush().await.unwrap();
    assert_eq!(cart.persist_status().persisted_version, 1);
    let stored = storage.stored_items(DEFAULT_KEY).await.unwrap();
    assert_eq!(lines(&stored), [("1".to_string(), 1)]);
}

#[test]
fn test_config_selects_memory_backend_by_default() {
    let config = CartConfig::default();
    assert!(matches!(config.open_storage(), StorageBackend::Memory(_)));
}
