//! Write-back persistence of committed cart state.
//!
//! The mutation worker hands every committed [`CartState`] to a `watch`
//! channel and moves on. A single persister task drains that channel and
//! writes to storage. Because `watch` only retains the newest value, a state
//! committed while a write is in flight replaces any state still waiting:
//! intermediate versions are skipped, writes for one key never overlap, and
//! an older state can never land after a newer one.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info_span};

use crate::codec;
use crate::error::{CartError, StorageError};
use crate::state::CartState;
use crate::storage::KeyValueStorage;
use crate::subscription::Listeners;

/// A write that did not reach storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistFailure {
    /// Commit version the write carried.
    pub version: u64,
    /// Adapter error.
    pub error: StorageError,
}

/// Progress of the persister.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistStatus {
    /// Highest commit version known to be durable. The state loaded at
    /// startup (version 0) counts as durable.
    pub persisted_version: u64,
    /// Writes attempted so far, successful or not.
    pub attempts: u64,
    /// Most recent failure; cleared by the next successful write.
    pub last_failure: Option<PersistFailure>,
}

/// Handle to the persister task.
pub(crate) struct WriteBack {
    committed: watch::Sender<CartState>,
    status: watch::Receiver<PersistStatus>,
}

impl WriteBack {
    /// Spawn the persister for `key`, treating `initial` as already durable.
    pub(crate) fn spawn<S: KeyValueStorage>(
        storage: Arc<S>,
        key: String,
        initial: CartState,
        failures: Arc<Listeners<PersistFailure>>,
    ) -> (Self, JoinHandle<()>) {
        let (committed_tx, committed_rx) = watch::channel(initial);
        let (status_tx, status_rx) = watch::channel(PersistStatus::default());

        let span = info_span!("cart_persister", key = %key);
        let task = tokio::spawn(
            run_persister(storage, key, committed_rx, status_tx, failures).instrument(span),
        );

        (
            Self {
                committed: committed_tx,
                status: status_rx,
            },
            task,
        )
    }

    /// Queue `state` for writing, superseding any state not yet written.
    pub(crate) fn schedule(&self, state: CartState) {
        self.committed.send_replace(state);
    }

    pub(crate) fn status(&self) -> PersistStatus {
        self.status.borrow().clone()
    }

    /// Wait until `target` (or a later version) is durable.
    ///
    /// If the last write failed, this triggers another attempt with the
    /// newest committed state.
    pub(crate) async fn flush(&self, target: u64) -> Result<(), CartError> {
        let mut status = self.status.clone();
        let attempts_before = {
            let current = status.borrow_and_update();
            if current.persisted_version >= target {
                return Ok(());
            }
            current.attempts
        };

        // Wake the persister even when it has already seen (and failed) this version.
        self.committed.send_modify(|_| {});

        let settled = status
            .wait_for(|s| {
                s.persisted_version >= target
                    || (s.attempts > attempts_before
                        && s.last_failure.as_ref().is_some_and(|f| f.version >= target))
            })
            .await
            .map_err(|_| CartError::Closed)?;

        if settled.persisted_version >= target {
            return Ok(());
        }
        match settled.last_failure.clone() {
            Some(failure) => Err(CartError::Storage {
                version: failure.version,
                source: failure.error,
            }),
            None => Ok(()),
        }
    }
}

async fn run_persister<S: KeyValueStorage>(
    storage: Arc<S>,
    key: String,
    mut committed: watch::Receiver<CartState>,
    status: watch::Sender<PersistStatus>,
    failures: Arc<Listeners<PersistFailure>>,
) {
    while committed.changed().await.is_ok() {
        let state = committed.borrow_and_update().clone();
        if state.version() <= status.borrow().persisted_version {
            continue;
        }

        let result = match codec::encode(state.items()) {
            Ok(payload) => storage.set(&key, payload).await,
            Err(e) => Err(StorageError::unavailable(e)),
        };

        match result {
            Ok(()) => {
                debug!(version = state.version(), lines = state.len(), "Persisted cart");
                status.send_modify(|s| {
                    s.attempts += 1;
                    s.persisted_version = state.version();
                    s.last_failure = None;
                });
            }
            Err(error) => {
                error!(version = state.version(), error = %error, "Failed to persist cart");
                let failure = PersistFailure {
                    version: state.version(),
                    error,
                };
                failures.notify(&failure);
                status.send_modify(|s| {
                    s.attempts += 1;
                    s.last_failure = Some(failure);
                });
            }
        }
    }

    debug!("Commit channel closed, persister stopping");
}
