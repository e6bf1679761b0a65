//! Cart service: the single writer.
//!
//! Every mutation is pushed onto one FIFO queue at call time and applied by
//! a single worker task. The worker reads the store's live state, computes
//! the next state synchronously and commits it before it looks at the next
//! request, so two requests issued back to back can never both start from
//! the same pre-mutation snapshot.
//!
//! After each commit the worker hands the new state to the write-back
//! persister and then notifies change listeners. Callers see the commit as
//! soon as their future resolves; durability follows asynchronously
//! (see [`CartService::flush`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use marketplace_cart::{CartConfig, CartService, MemoryStorage};
//! use marketplace_core::{Price, ProductRef};
//!
//! # async fn demo() -> Result<(), marketplace_cart::CartError> {
//! let cart = CartService::start(MemoryStorage::new(), &CartConfig::default()).await;
//!
//! let _sub = cart.on_change(|state| {
//!     println!("{} items, subtotal {}", state.total_quantity(), state.subtotal());
//! });
//!
//! let shirt = ProductRef::new("1", "Shirt", "https://img/shirt.png", Price::from_cents(1000));
//! cart.add_item(shirt).await?;
//! cart.increment_item("1").await?;
//! cart.flush().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use marketplace_core::{CartItem, ProductId, ProductRef, Quantity};
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use crate::config::CartConfig;
use crate::error::CartError;
use crate::mutation::Mutation;
use crate::persistence::{PersistFailure, PersistStatus, WriteBack};
use crate::state::CartState;
use crate::storage::KeyValueStorage;
use crate::store::CartStore;
use crate::subscription::{Listeners, Subscription};

/// Work item for the mutation worker.
enum Command {
    Mutate {
        mutation: Mutation,
        reply: oneshot::Sender<CartState>,
    },
    Stop {
        done: oneshot::Sender<()>,
    },
}

/// Handle to the cart engine.
///
/// Cheaply cloneable via `Arc`; all clones drive the same cart. Owned by the
/// host application's composition root and passed to whatever needs it.
#[derive(Clone)]
pub struct CartService {
    inner: Arc<CartServiceInner>,
}

struct CartServiceInner {
    store: Arc<CartStore>,
    queue: mpsc::UnboundedSender<Command>,
    write_back: Arc<WriteBack>,
    changes: Arc<Listeners<CartState>>,
    failures: Arc<Listeners<PersistFailure>>,
}

impl CartService {
    /// Hydrate the cart from `storage` and start the mutation worker and
    /// the persister.
    ///
    /// Never fails: an unreadable store or a malformed snapshot yields an
    /// empty cart and a warning.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[instrument(skip_all, fields(key = %config.storage_key()))]
    pub async fn start<S: KeyValueStorage>(storage: S, config: &CartConfig) -> Self {
        let key = config.storage_key();

        let persisted = match storage.get(&key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Could not read persisted cart, starting empty");
                None
            }
        };
        let store = Arc::new(CartStore::load(persisted.as_deref()));

        let changes = Listeners::new();
        let failures = Listeners::new();

        let (write_back, _persister) = WriteBack::spawn(
            Arc::new(storage),
            key,
            store.state(),
            Arc::clone(&failures),
        );
        let write_back = Arc::new(write_back);

        let (queue, requests) = mpsc::unbounded_channel();
        tokio::spawn(
            run_mutations(
                requests,
                Arc::clone(&store),
                Arc::clone(&write_back),
                Arc::clone(&changes),
            )
            .instrument(info_span!("cart_mutations")),
        );

        info!(lines = store.current_items().len(), "Cart service started");

        Self {
            inner: Arc::new(CartServiceInner {
                store,
                queue,
                write_back,
                changes,
                failures,
            }),
        }
    }

    /// Add one unit of `product`.
    ///
    /// If the product is already in the cart its line keeps its position,
    /// takes the new title, image and price, and gains one unit. Otherwise a
    /// new line with quantity 1 is appended.
    ///
    /// A line already holding [`Quantity::MAX`] units stays at that cap; the
    /// call still succeeds and a warning is logged. With unchanged metadata
    /// nothing is committed.
    ///
    /// The request is queued before this method returns, so calls are
    /// applied in call order even if their futures are awaited later or not
    /// at all. Resolves to the state committed by this request.
    pub fn add_item(
        &self,
        product: ProductRef,
    ) -> impl Future<Output = Result<CartState, CartError>> + Send + use<> {
        self.submit(Mutation::Add(product))
    }

    /// Add one unit to the line for `id`. Unknown IDs, and lines already at
    /// [`Quantity::MAX`], leave the cart unchanged.
    pub fn increment_item<I: Into<ProductId>>(
        &self,
        id: I,
    ) -> impl Future<Output = Result<CartState, CartError>> + Send + use<I> {
        self.submit(Mutation::Increment(id.into()))
    }

    /// Remove one unit from the line for `id`, stopping at 1.
    /// Unknown IDs leave the cart unchanged.
    pub fn decrement_item<I: Into<ProductId>>(
        &self,
        id: I,
    ) -> impl Future<Output = Result<CartState, CartError>> + Send + use<I> {
        self.submit(Mutation::Decrement(id.into()))
    }

    /// The committed item list, oldest line first.
    #[must_use]
    pub fn current_items(&self) -> Arc<[CartItem]> {
        self.inner.store.current_items()
    }

    /// The committed state, including version and totals.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.inner.store.state()
    }

    /// Call `listener` with the new state after every committed mutation.
    ///
    /// Listeners run on the mutation worker; keep them short.
    pub fn on_change(
        &self,
        listener: impl Fn(&CartState) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.changes.subscribe(listener)
    }

    /// Call `listener` whenever a persistence write fails.
    ///
    /// The in-memory cart is not rolled back; the next successful write
    /// brings storage up to date.
    pub fn on_persist_error(
        &self,
        listener: impl Fn(&PersistFailure) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.failures.subscribe(listener)
    }

    /// Progress of the write-back persister.
    #[must_use]
    pub fn persist_status(&self) -> PersistStatus {
        self.inner.write_back.status()
    }

    /// Wait until the state committed at the time of the call is durable.
    ///
    /// Retries the write if the previous attempt failed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the write fails, or
    /// [`CartError::Closed`] if the persister is gone.
    pub async fn flush(&self) -> Result<(), CartError> {
        let target = self.inner.store.state().version();
        self.inner.write_back.flush(target).await
    }

    /// Stop admitting mutations, wait for the queued ones to commit, then flush.
    ///
    /// Mutations requested after this call fail with [`CartError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns the flush error if the final write fails.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), CartError> {
        let (done, stopped) = oneshot::channel();
        if self.inner.queue.send(Command::Stop { done }).is_ok() {
            let _ = stopped.await;
            info!("Cart mutation queue drained");
        }
        self.flush().await
    }

    fn submit(
        &self,
        mutation: Mutation,
    ) -> impl Future<Output = Result<CartState, CartError>> + Send + use<> {
        debug!(
            kind = mutation.kind(),
            product_id = %mutation.product_id(),
            "Queueing cart mutation"
        );

        let (reply, committed) = oneshot::channel();
        let admitted = self
            .inner
            .queue
            .send(Command::Mutate { mutation, reply })
            .is_ok();

        async move {
            if !admitted {
                return Err(CartError::Closed);
            }
            committed.await.map_err(|_| CartError::Closed)
        }
    }
}

impl fmt::Debug for CartService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("CartService")
            .field("version", &state.version())
            .field("lines", &state.len())
            .field("listeners", &self.inner.changes.len())
            .field("persist_status", &self.persist_status())
            .finish_non_exhaustive()
    }
}

async fn run_mutations(
    mut requests: mpsc::UnboundedReceiver<Command>,
    store: Arc<CartStore>,
    write_back: Arc<WriteBack>,
    changes: Arc<Listeners<CartState>>,
) {
    while let Some(command) = requests.recv().await {
        match command {
            Command::Mutate { mutation, reply } => {
                let state = commit(&store, &write_back, &changes, &mutation);
                // The caller may have dropped its future; the commit stands regardless.
                let _ = reply.send(state);
            }
            Command::Stop { done } => {
                let _ = done.send(());
                break;
            }
        }
    }

    debug!("Mutation queue closed");
}

/// Apply one mutation against the live state. Runs without yielding.
fn commit(
    store: &CartStore,
    write_back: &WriteBack,
    changes: &Listeners<CartState>,
    mutation: &Mutation,
) -> CartState {
    let current = store.current_items();
    if mutation.hits_quantity_cap(&current) {
        warn!(
            kind = mutation.kind(),
            product_id = %mutation.product_id(),
            cap = Quantity::MAX.get(),
            "Cart line is at its maximum quantity"
        );
    }

    let Some(items) = mutation.apply(&current) else {
        debug!(
            kind = mutation.kind(),
            product_id = %mutation.product_id(),
            "Cart mutation was a no-op"
        );
        return store.state();
    };

    let state = store.replace(items);
    debug!(
        version = state.version(),
        kind = mutation.kind(),
        product_id = %mutation.product_id(),
        "Committed cart mutation"
    );

    write_back.schedule(state.clone());
    changes.notify(&state);
    state
}
