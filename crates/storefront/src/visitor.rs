//! Visitors: one browser's cart, checkout and sign-in.
//!
//! A visitor is identified by the id stored in its session cookie. Its cart
//! and profile fields live in a durable store opened per visitor; checkout
//! progress and the signed-in user live only in memory. Idle visitors are
//! evicted from the [`VisitorRegistry`] and rebuilt from storage on their
//! next request.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, info};
use uuid::Uuid;

use gallery_core::CheckoutForm;

use crate::cart::CartEngine;
use crate::checkout::{
    AutoCloseTimer, CheckoutError, CheckoutSession, CheckoutView, ContactPrefill,
};
use crate::profile::ProfileStore;
use crate::services::auth::AuthState;
use crate::storage::{SharedStore, StorageBackend, StorageError};

/// Maximum number of visitors kept in memory.
const MAX_CACHED_VISITORS: u64 = 10_000;

/// State of one visitor.
#[derive(Debug)]
pub struct Visitor {
    id: Uuid,
    storage: SharedStore,
    cart: CartEngine<SharedStore>,
    checkout: CheckoutSession,
    auth: AuthState,
}

impl Visitor {
    /// Rebuild a visitor from its storage: the cart is restored, checkout
    /// starts closed and nobody is signed in.
    #[must_use]
    pub fn restore(id: Uuid, storage: SharedStore) -> Self {
        Self {
            id,
            cart: CartEngine::restore(Arc::clone(&storage)),
            storage,
            checkout: CheckoutSession::new(),
            auth: AuthState::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn cart(&self) -> &CartEngine<SharedStore> {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartEngine<SharedStore> {
        &mut self.cart
    }

    #[must_use]
    pub const fn checkout(&self) -> &CheckoutSession {
        &self.checkout
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthState {
        &self.auth
    }

    /// Profile fields stored by this visitor.
    #[must_use]
    pub fn profiles(&self) -> ProfileStore<SharedStore> {
        ProfileStore::new(Arc::clone(&self.storage))
    }

    /// Contact details of the signed-in user, stored display name first.
    fn contact_prefill(&self) -> ContactPrefill {
        self.auth
            .current()
            .map(|user| {
                let resolved = self.profiles().resolve(&user);
                ContactPrefill {
                    full_name: resolved.display_name,
                    email: resolved.email,
                }
            })
            .unwrap_or_default()
    }

    /// Open checkout over the current cart.
    ///
    /// # Errors
    ///
    /// See [`CheckoutSession::open`].
    pub fn open_checkout(&mut self) -> Result<(), CheckoutError> {
        let prefill = self.contact_prefill();
        self.checkout.open(self.cart.items(), &prefill)
    }

    /// Submit the checkout form.
    ///
    /// # Errors
    ///
    /// See [`CheckoutSession::submit_details`].
    pub fn submit_checkout_details(&mut self, form: CheckoutForm) -> Result<(), CheckoutError> {
        self.checkout.submit_details(form, self.cart.items())
    }

    /// Return to the details step.
    ///
    /// # Errors
    ///
    /// See [`CheckoutSession::back`].
    pub fn checkout_back(&mut self) -> Result<(), CheckoutError> {
        self.checkout.back()
    }

    /// Close checkout, cancelling a pending auto-close.
    pub fn close_checkout(&mut self) {
        self.checkout.close();
    }

    /// Complete the order confirmed under `ticket`.
    ///
    /// Returns `false` when the ticket is stale.
    pub fn finish_order(&mut self, ticket: u64) -> bool {
        let finished = self.checkout.complete(ticket, &mut self.cart);
        if finished {
            info!(visitor_id = %self.id, "order completed, checkout closed");
        } else {
            debug!(visitor_id = %self.id, ticket, "ignoring stale auto-close");
        }
        finished
    }

    /// Checkout as rendered against the live cart.
    ///
    /// # Errors
    ///
    /// See [`CheckoutSession::view`].
    pub fn checkout_view(&self) -> Result<CheckoutView, CheckoutError> {
        self.checkout.view(self.cart.items())
    }
}

/// Shared, lockable visitor.
///
/// The lock is synchronous: never hold the guard across an `.await`.
#[derive(Debug, Clone)]
pub struct VisitorHandle(Arc<Mutex<Visitor>>);

impl VisitorHandle {
    #[must_use]
    pub fn new(visitor: Visitor) -> Self {
        Self(Arc::new(Mutex::new(visitor)))
    }

    /// Lock the visitor. A poisoned lock is recovered; every engine
    /// operation leaves its state consistent before it can panic.
    pub fn lock(&self) -> MutexGuard<'_, Visitor> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Confirm the order and arm the auto-close timer.
    ///
    /// The timer holds only a weak reference, so an evicted visitor is not
    /// kept alive by a pending close.
    ///
    /// # Errors
    ///
    /// See [`CheckoutSession::confirm`].
    pub fn confirm_order(&self, auto_close: Duration) -> Result<u64, CheckoutError> {
        let mut guard = self.lock();
        let visitor = &mut *guard;
        let ticket = visitor.checkout.confirm(visitor.cart.items())?;

        let weak = Arc::downgrade(&self.0);
        let timer = AutoCloseTimer::spawn(auto_close, move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .finish_order(ticket);
            }
        });
        visitor.checkout.arm(timer);

        info!(visitor_id = %visitor.id, ticket, "order confirmed");
        Ok(ticket)
    }
}

/// In-memory cache of visitors, backed by durable storage.
#[derive(Clone)]
pub struct VisitorRegistry {
    cache: Cache<Uuid, VisitorHandle>,
    backend: StorageBackend,
}

impl VisitorRegistry {
    /// Create a registry that evicts visitors idle for longer than `idle`.
    #[must_use]
    pub fn new(backend: StorageBackend, idle: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHED_VISITORS)
            .time_to_idle(idle)
            .build();
        Self { cache, backend }
    }

    /// Fetch a cached visitor or rebuild it from storage.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the visitor's store cannot be opened.
    pub async fn get_or_restore(&self, id: Uuid) -> Result<VisitorHandle, StorageError> {
        if let Some(handle) = self.cache.get(&id).await {
            return Ok(handle);
        }

        let storage = self.backend.open(&id.simple().to_string())?;
        let handle = VisitorHandle::new(Visitor::restore(id, storage));
        debug!(visitor_id = %id, "visitor restored");
        Ok(self.cache.get_with(id, async move { handle }).await)
    }
}

impl std::fmt::Debug for VisitorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitorRegistry")
            .field("visitors", &self.cache.entry_count())
            .field("backend", &self.backend)
            .finish()
    }
}
