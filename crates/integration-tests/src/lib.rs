//! Test harness for the 4Fun sync engine.
//!
//! Provides scripted in-process fakes of the remote backend and the
//! local persistence adapter, with call recording and failure injection,
//! plus product fixtures shared across the test files.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::Notify;

use four_fun_core::{Cart, CartLine, CartSnapshot, EntityRef, LineId, Product, ProductId, ProductKind, UserId};
use four_fun_storefront::backend::{BackendError, RemoteStore};
use four_fun_storefront::local::{LocalStore, MemoryStore};
use four_fun_storefront::session::Identity;

/// Initialize test logging once; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// A canonical product fixture.
#[must_use]
pub fn product(id: &str, name: &str, price: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: String::new(),
        price: price.parse().expect("decimal literal"),
        stock: 10,
        image_url: "/placeholder.png".to_string(),
        platform: EntityRef::new("pc", "PC"),
        genre: EntityRef::new("action", "Action"),
        kind: ProductKind::Digital,
        developer: "Studio".to_string(),
        rating: 0.0,
        release_date: Utc::now(),
    }
}

/// An authenticated identity fixture.
#[must_use]
pub fn identity(user: &str) -> Identity {
    Identity::new(UserId::new(user), format!("token-{user}"))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Gate - holds a remote mutation in flight until released
// =============================================================================

/// Coordination point for in-flight-request tests: the fake signals when
/// a gated mutation has entered, and the test decides when it proceeds.
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until a gated remote mutation is in flight.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let the in-flight mutation proceed.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

// =============================================================================
// FakeRemote - scripted backend
// =============================================================================

/// In-process stand-in for the remote store.
///
/// Keeps a server-side cart (merging adds by product, issuing `srv-`
/// line ids) and wishlist, records every call, and supports failure
/// injection and gating.
#[derive(Clone, Default)]
pub struct FakeRemote {
    inner: Arc<FakeRemoteInner>,
}

#[derive(Default)]
struct FakeRemoteInner {
    cart: Mutex<Vec<CartLine>>,
    wishlist: Mutex<Vec<Product>>,
    calls: Mutex<Vec<&'static str>>,
    fail_mutations: AtomicBool,
    fail_reads: AtomicBool,
    gate: Mutex<Option<Arc<Gate>>>,
}

impl FakeRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the server-side cart with a line.
    pub fn seed_cart_line(&self, product: &Product, quantity: u32) {
        lock(&self.inner.cart).push(CartLine {
            id: LineId::new(format!("srv-{}", product.id)),
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity,
            image_url: Some(product.image_url.clone()),
        });
    }

    /// Seed the server-side wishlist.
    pub fn seed_wishlist(&self, product: &Product) {
        lock(&self.inner.wishlist).push(product.clone());
    }

    /// Every recorded call name, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.inner.calls).clone()
    }

    /// Forget recorded calls.
    pub fn reset_calls(&self) {
        lock(&self.inner.calls).clear();
    }

    /// Make every subsequent mutation fail with a 500.
    pub fn fail_mutations(&self, fail: bool) {
        self.inner.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read fail with a 500.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Gate subsequent mutations: each one signals the gate and then
    /// waits for [`Gate::release`] before proceeding.
    #[must_use]
    pub fn install_gate(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *lock(&self.inner.gate) = Some(Arc::clone(&gate));
        gate
    }

    /// Server-side cart contents.
    #[must_use]
    pub fn server_cart(&self) -> Vec<CartLine> {
        lock(&self.inner.cart).clone()
    }

    fn record(&self, call: &'static str) {
        lock(&self.inner.calls).push(call);
    }

    fn injected() -> BackendError {
        BackendError::Api {
            status: 500,
            message: "injected failure".to_string(),
        }
    }

    async fn mutation_entry(&self, call: &'static str) -> Result<(), BackendError> {
        self.record(call);

        let gate = lock(&self.inner.gate).clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.inner.fail_mutations.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        Ok(())
    }

    fn read_entry(&self, call: &'static str) -> Result<(), BackendError> {
        self.record(call);
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        Ok(())
    }
}

impl RemoteStore for FakeRemote {
    async fn get_cart(&self, _identity: &Identity) -> Result<Vec<CartLine>, BackendError> {
        self.read_entry("get_cart")?;
        Ok(lock(&self.inner.cart).clone())
    }

    async fn add_to_cart(
        &self,
        _identity: &Identity,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        self.mutation_entry("add_to_cart").await?;

        let mut cart = lock(&self.inner.cart);
        if let Some(line) = cart.iter_mut().find(|line| &line.product_id == product_id) {
            line.quantity += quantity;
        } else {
            cart.push(CartLine {
                id: LineId::new(format!("srv-{product_id}")),
                product_id: product_id.clone(),
                name: format!("Product {product_id}"),
                price: rust_decimal::Decimal::ZERO,
                quantity,
                image_url: None,
            });
        }
        Ok(())
    }

    async fn update_cart_item(
        &self,
        _identity: &Identity,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        self.mutation_entry("update_cart_item").await?;

        let mut cart = lock(&self.inner.cart);
        if let Some(line) = cart.iter_mut().find(|line| &line.id == line_id) {
            line.quantity = quantity;
        }
        Ok(())
    }

    async fn remove_from_cart(
        &self,
        _identity: &Identity,
        line_id: &LineId,
    ) -> Result<(), BackendError> {
        self.mutation_entry("remove_from_cart").await?;
        lock(&self.inner.cart).retain(|line| &line.id != line_id);
        Ok(())
    }

    async fn clear_cart(&self, _identity: &Identity) -> Result<(), BackendError> {
        self.mutation_entry("clear_cart").await?;
        lock(&self.inner.cart).clear();
        Ok(())
    }

    async fn get_wishlist(&self, _identity: &Identity) -> Result<Vec<Product>, BackendError> {
        self.read_entry("get_wishlist")?;
        Ok(lock(&self.inner.wishlist).clone())
    }

    async fn toggle_wishlist(
        &self,
        _identity: &Identity,
        product_id: &ProductId,
    ) -> Result<(), BackendError> {
        self.mutation_entry("toggle_wishlist").await?;

        let mut wishlist = lock(&self.inner.wishlist);
        if wishlist.iter().any(|entry| &entry.id == product_id) {
            wishlist.retain(|entry| &entry.id != product_id);
        } else {
            wishlist.push(product(product_id.as_str(), "Wishlisted", "0"));
        }
        Ok(())
    }
}

// =============================================================================
// RecordingLocal - local adapter with call recording
// =============================================================================

/// [`MemoryStore`] wrapper that records every adapter call, for
/// asserting the authenticated mode never touches local persistence.
#[derive(Clone, Default)]
pub struct RecordingLocal {
    inner: Arc<RecordingLocalInner>,
}

#[derive(Default)]
struct RecordingLocalInner {
    store: MemoryStore,
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingLocal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded adapter call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.inner.calls).clone()
    }

    /// Forget recorded calls.
    pub fn reset_calls(&self) {
        lock(&self.inner.calls).clear();
    }

    /// The persisted snapshot, bypassing call recording.
    #[must_use]
    pub fn stored(&self) -> Option<CartSnapshot> {
        self.inner.store.load()
    }

    /// The persisted snapshot as a cart, for convenient assertions.
    #[must_use]
    pub fn stored_cart(&self) -> Cart {
        Cart::from_snapshot(self.stored().unwrap_or_default())
    }
}

impl LocalStore for RecordingLocal {
    fn load(&self) -> Option<CartSnapshot> {
        lock(&self.inner.calls).push("load");
        self.inner.store.load()
    }

    fn save(&self, snapshot: &CartSnapshot) {
        lock(&self.inner.calls).push("save");
        self.inner.store.save(snapshot);
    }

    fn clear(&self) {
        lock(&self.inner.calls).push("clear");
        self.inner.store.clear();
    }
}
