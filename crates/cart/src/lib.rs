//! Marketplace Cart - Cart state synchronization engine.
//!
//! Keeps a client's shopping cart in memory and durable across restarts by
//! mirroring it into a key-value store.
//!
//! # Architecture
//!
//! - [`CartStore`] owns the authoritative in-memory item list
//! - [`CartService`] serializes mutations through one FIFO queue and a single
//!   worker, so every mutation is computed from the latest committed state
//! - The write-back persister writes only the newest committed state and
//!   skips states superseded while a write was in flight
//! - [`Subscription`]s notify observers of commits and of write failures
//!
//! # Modules
//!
//! - [`codec`] - JSON snapshot format stored under the cart key
//! - [`config`] - Namespace and storage selection from environment variables
//! - [`mutation`] - Pure add / increment / decrement algorithms
//! - [`storage`] - [`KeyValueStorage`] trait plus memory and file adapters

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod codec;
pub mod config;
pub mod error;
pub mod mutation;
pub mod storage;

mod persistence;
mod service;
mod state;
mod store;
mod subscription;

pub use config::{CartConfig, ConfigError};
pub use error::{CartError, SnapshotError, StorageError};
pub use mutation::Mutation;
pub use persistence::{PersistFailure, PersistStatus};
pub use service::CartService;
pub use state::CartState;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageBackend};
pub use store::CartStore;
pub use subscription::Subscription;
