//! The cart/wishlist sync orchestrator.
//!
//! [`SyncEngine`] owns the in-memory aggregates and is the only component
//! that touches the two persistence backends. Every mutation follows the
//! same shape:
//!
//! 1. capture the pre-mutation snapshot (a [`MutationTxn`])
//! 2. apply the mutation to in-memory state immediately (optimistic)
//! 3. anonymous session: persist to the local adapter, done - the remote
//!    store is never called
//! 4. authenticated session: issue the remote call, then replace local
//!    state with an authoritative re-fetch on success, or restore the
//!    snapshot on failure - the local adapter is never touched
//!
//! Responses arriving under a superseded session generation (the user
//! signed out or in while the request was in flight) are discarded
//! rather than applied.
//!
//! The engine is cheaply cloneable; clones share state, so multiple
//! mutations may be in flight concurrently. The state mutex is only held
//! for synchronous sections, never across an await.

mod mutation;

pub use mutation::MutationPhase;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use four_fun_core::{Cart, CartSnapshot, LineId, Product, ProductId, Wishlist};

use crate::backend::{BackendError, RemoteStore};
use crate::error::{Result, SyncError};
use crate::local::LocalStore;
use crate::session::{Generation, Identity, MergePolicy, SessionMode};

use mutation::MutationTxn;

// =============================================================================
// SyncEngine
// =============================================================================

/// Orchestrates optimistic cart/wishlist mutations across the local and
/// remote persistence backends.
pub struct SyncEngine<R, L> {
    inner: Arc<EngineInner<R, L>>,
}

impl<R, L> Clone for SyncEngine<R, L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct EngineInner<R, L> {
    remote: R,
    local: L,
    merge_policy: MergePolicy,
    state: Mutex<EngineState>,
}

#[derive(Default)]
struct EngineState {
    cart: Cart,
    wishlist: Wishlist,
    mode: SessionMode,
    generation: Generation,
}

/// What a cart mutation does after its optimistic apply, decided by the
/// session mode at apply time.
enum ModeAction {
    /// Anonymous: persist this snapshot locally, no remote call.
    PersistLocal(CartSnapshot),
    /// Authenticated: issue the remote call under this identity.
    CallRemote(Identity),
}

impl<R: RemoteStore, L: LocalStore> SyncEngine<R, L> {
    /// Create an engine in the anonymous mode with an empty cart.
    ///
    /// Call [`refresh`](Self::refresh) afterwards to load any persisted
    /// local snapshot.
    pub fn new(remote: R, local: L, merge_policy: MergePolicy) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                remote,
                local,
                merge_policy,
                state: Mutex::new(EngineState::default()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Read Accessors
    // =========================================================================

    /// Snapshot of the current cart contents.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.state().cart.clone()
    }

    /// Sum of `price * quantity` across the cart.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.state().cart.total()
    }

    /// Sum of quantities across the cart.
    #[must_use]
    pub fn cart_count(&self) -> u32 {
        self.state().cart.count()
    }

    /// Snapshot of the current wishlist contents.
    #[must_use]
    pub fn wishlist(&self) -> Wishlist {
        self.state().wishlist.clone()
    }

    /// Whether a product is currently wishlisted.
    #[must_use]
    pub fn in_wishlist(&self, product_id: &ProductId) -> bool {
        self.state().wishlist.contains(product_id)
    }

    /// The current session mode.
    #[must_use]
    pub fn session(&self) -> SessionMode {
        self.state().mode.clone()
    }

    // =========================================================================
    // Session Transitions
    // =========================================================================

    /// Load state for the current mode: the persisted local snapshot when
    /// anonymous, the authoritative remote cart and wishlist when
    /// authenticated.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RemoteMutation`] when an authenticated fetch
    /// fails; in-memory state is left as it was.
    pub async fn refresh(&self) -> Result<()> {
        let (mode, issued_under) = {
            let state = self.state();
            (state.mode.clone(), state.generation)
        };

        match mode {
            SessionMode::Anonymous => {
                let snapshot = self.inner.local.load().unwrap_or_default();
                let mut state = self.state();
                if state.generation == issued_under {
                    state.cart = Cart::from_snapshot(snapshot);
                }
                Ok(())
            }
            SessionMode::Authenticated(identity) => {
                let lines = self.inner.remote.get_cart(&identity).await?;
                let entries = self.inner.remote.get_wishlist(&identity).await?;

                let mut state = self.state();
                if state.generation != issued_under {
                    debug!(
                        issued_under = %issued_under,
                        current = %state.generation,
                        "Discarding stale refresh snapshot"
                    );
                    return Ok(());
                }
                state.cart.replace(lines);
                state.wishlist.replace(entries);
                Ok(())
            }
        }
    }

    /// Switch to the authenticated mode and pull authoritative state.
    ///
    /// The anonymous cart is handled per the engine's [`MergePolicy`]:
    /// replaced outright (default) or pushed line-by-line into the remote
    /// cart first. Merged lines that fail to push are logged and dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RemoteMutation`] when the authoritative pull
    /// fails.
    #[instrument(skip_all, fields(user = %identity.user_id))]
    pub async fn sign_in(&self, identity: Identity) -> Result<()> {
        let anonymous_lines = {
            let mut state = self.state();
            state.generation.bump();
            state.mode = SessionMode::Authenticated(identity.clone());
            state.cart.snapshot()
        };

        if self.inner.merge_policy == MergePolicy::MergeLocalIntoRemote {
            for line in &anonymous_lines.0 {
                if let Err(e) = self
                    .inner
                    .remote
                    .add_to_cart(&identity, &line.product_id, line.quantity)
                    .await
                {
                    warn!(
                        product = %line.product_id,
                        error = %e,
                        "Failed to merge anonymous cart line; dropping it"
                    );
                }
            }
            self.inner.local.clear();
        }

        self.refresh().await
    }

    /// Switch to the anonymous mode, clearing all in-memory state and
    /// discarding local persistence.
    pub fn sign_out(&self) {
        {
            let mut state = self.state();
            state.generation.bump();
            state.mode = SessionMode::Anonymous;
            state.cart.clear();
            state.wishlist.clear();
        }
        self.inner.local.clear();
    }

    // =========================================================================
    // Cart Mutations
    // =========================================================================

    /// Add a product to the cart, merging into an existing line when the
    /// product is already present.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RemoteMutation`] when the remote store
    /// rejects the change; in-memory state is rolled back first.
    #[instrument(skip(self, product), fields(product = %product.id))]
    pub async fn add_to_cart(&self, product: &Product, quantity: u32) -> Result<()> {
        let (txn, action) = self.optimistic_apply(|cart| {
            cart.add(product, quantity);
        });

        match action {
            ModeAction::PersistLocal(snapshot) => self.confirm_local(txn, &snapshot),
            ModeAction::CallRemote(identity) => {
                let result = self
                    .inner
                    .remote
                    .add_to_cart(&identity, &product.id, quantity.max(1))
                    .await;
                self.reconcile_cart(txn, &identity, result).await
            }
        }
    }

    /// Set a line's quantity. Zero or less is a removal, never a stored
    /// non-positive quantity.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RemoteMutation`] when the remote store
    /// rejects the change; in-memory state is rolled back first.
    #[instrument(skip(self))]
    pub async fn set_quantity(&self, line_id: &LineId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return self.remove_from_cart(line_id).await;
        }

        let (txn, action) = self.optimistic_apply(|cart| {
            cart.set_quantity(line_id, quantity);
        });

        match action {
            ModeAction::PersistLocal(snapshot) => self.confirm_local(txn, &snapshot),
            ModeAction::CallRemote(identity) => {
                let result = self
                    .inner
                    .remote
                    .update_cart_item(&identity, line_id, quantity)
                    .await;
                self.reconcile_cart(txn, &identity, result).await
            }
        }
    }

    /// Remove a line. Removing a line that is not present is a no-op,
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RemoteMutation`] when the remote store
    /// rejects the change; in-memory state is rolled back first.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, line_id: &LineId) -> Result<()> {
        let (txn, action) = self.optimistic_apply(|cart| {
            cart.remove(line_id);
        });

        match action {
            ModeAction::PersistLocal(snapshot) => self.confirm_local(txn, &snapshot),
            ModeAction::CallRemote(identity) => {
                let result = self
                    .inner
                    .remote
                    .remove_from_cart(&identity, line_id)
                    .await;
                self.reconcile_cart(txn, &identity, result).await
            }
        }
    }

    /// Remove every line from the cart.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RemoteMutation`] when the remote store
    /// rejects the change; in-memory state is rolled back first.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<()> {
        let (txn, action) = self.optimistic_apply(Cart::clear);

        match action {
            ModeAction::PersistLocal(_) => {
                // An empty anonymous cart drops the stored snapshot
                // entirely rather than persisting an empty array.
                self.inner.local.clear();
                self.finish_local(txn)
            }
            ModeAction::CallRemote(identity) => {
                let result = self.inner.remote.clear_cart(&identity).await;
                self.reconcile_cart(txn, &identity, result).await
            }
        }
    }

    // =========================================================================
    // Wishlist Mutations
    // =========================================================================

    /// Toggle a product's wishlist membership.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AuthRequired`] in the anonymous mode (the
    /// wishlist has no local fallback), or
    /// [`SyncError::RemoteMutation`] when the remote store rejects the
    /// change; in-memory state is rolled back first.
    #[instrument(skip(self, product), fields(product = %product.id))]
    pub async fn toggle_wishlist(&self, product: &Product) -> Result<()> {
        let (mut txn, identity) = {
            let mut state = self.state();
            let Some(identity) = state.mode.identity().cloned() else {
                return Err(SyncError::AuthRequired);
            };
            let mut txn = MutationTxn::begin(state.wishlist.clone(), state.generation);
            state.wishlist.toggle(product);
            txn.mark_optimistic();
            (txn, identity)
        };

        let result = self
            .inner
            .remote
            .toggle_wishlist(&identity, &product.id)
            .await;

        match result {
            Ok(()) => match self.inner.remote.get_wishlist(&identity).await {
                Ok(entries) => {
                    let mut state = self.state();
                    if txn.is_stale(state.generation) {
                        debug!(
                            issued_under = %txn.issued_under(),
                            "Discarding stale wishlist confirmation"
                        );
                        return Ok(());
                    }
                    state.wishlist.replace(entries);
                    txn.confirm();
                    Ok(())
                }
                Err(e) => self.roll_back_wishlist(txn, e),
            },
            Err(e) => self.roll_back_wishlist(txn, e),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Apply a cart mutation optimistically under the state lock and
    /// decide the follow-up from the session mode at apply time.
    fn optimistic_apply(
        &self,
        mutate: impl FnOnce(&mut Cart),
    ) -> (MutationTxn<CartSnapshot>, ModeAction) {
        let mut state = self.state();
        let mut txn = MutationTxn::begin(state.cart.snapshot(), state.generation);
        mutate(&mut state.cart);
        txn.mark_optimistic();

        let action = match &state.mode {
            SessionMode::Anonymous => ModeAction::PersistLocal(state.cart.snapshot()),
            SessionMode::Authenticated(identity) => ModeAction::CallRemote(identity.clone()),
        };
        (txn, action)
    }

    /// Anonymous confirmation: persist the post-mutation snapshot.
    fn confirm_local(&self, txn: MutationTxn<CartSnapshot>, snapshot: &CartSnapshot) -> Result<()> {
        self.inner.local.save(snapshot);
        self.finish_local(txn)
    }

    fn finish_local(&self, mut txn: MutationTxn<CartSnapshot>) -> Result<()> {
        txn.confirm();
        debug!(generation = %txn.issued_under(), "Cart mutation confirmed locally");
        Ok(())
    }

    /// Authenticated reconciliation: on success, trust the server's
    /// authoritative snapshot over the optimistic guess; on any failure
    /// (including a failed re-fetch) restore `S0` - the next refresh
    /// reconciles.
    async fn reconcile_cart(
        &self,
        mut txn: MutationTxn<CartSnapshot>,
        identity: &Identity,
        result: std::result::Result<(), BackendError>,
    ) -> Result<()> {
        let fetch = match result {
            Ok(()) => self.inner.remote.get_cart(identity).await,
            Err(e) => Err(e),
        };

        match fetch {
            Ok(lines) => {
                let mut state = self.state();
                if txn.is_stale(state.generation) {
                    debug!(
                        issued_under = %txn.issued_under(),
                        current = %state.generation,
                        "Discarding stale cart confirmation"
                    );
                    return Ok(());
                }
                state.cart.replace(lines);
                txn.confirm();
                Ok(())
            }
            Err(e) => {
                let mut state = self.state();
                if txn.is_stale(state.generation) {
                    debug!(
                        issued_under = %txn.issued_under(),
                        current = %state.generation,
                        error = %e,
                        "Discarding stale cart failure"
                    );
                    return Ok(());
                }
                state.cart.restore(txn.roll_back());
                warn!(error = %e, "Remote cart mutation failed; rolled back");
                Err(SyncError::RemoteMutation(e))
            }
        }
    }

    fn roll_back_wishlist(
        &self,
        mut txn: MutationTxn<Wishlist>,
        error: BackendError,
    ) -> Result<()> {
        let mut state = self.state();
        if txn.is_stale(state.generation) {
            debug!(
                issued_under = %txn.issued_under(),
                current = %state.generation,
                error = %error,
                "Discarding stale wishlist failure"
            );
            return Ok(());
        }
        state.wishlist = txn.roll_back();
        warn!(error = %error, "Remote wishlist mutation failed; rolled back");
        Err(SyncError::RemoteMutation(error))
    }
}
