//! Cart state holder.
//!
//! # Architecture
//!
//! - In-memory line items are authoritative for the running session
//! - Every change is mirrored to client storage (`cart` and `cartSet`)
//! - Signed-in users also get a best-effort sync to the remote cart:
//!   one spawned request per change, never retried, never rolled back
//! - [`CartStore::load`] replaces the items on every identity change;
//!   if two loads overlap, the last one started wins
//!
//! Mutations are only accepted once a load for the session's current
//! identity has finished; earlier calls, and calls made after a sign-in or
//! sign-out the cart has not caught up with, fail with
//! [`CartError::NotReady`].

mod backend;
mod types;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::SecretString;
use stoneart_core::ProductId;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

pub use backend::CartBackend;
pub use types::{
    CartItem, CartPhase, CartSnapshot, CartTotals, TAX_RATE, stored_items, stored_membership,
};

use crate::navigation::Navigation;
use crate::notice::{Notice, Notifier};
use crate::session::{Identity, SessionStore, guard};
use crate::storage::{ClientStorage, StorageError, keys};

/// Errors surfaced by cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The initial load has not finished.
    #[error("cart is still loading")]
    NotReady,

    /// Adding requires a signed-in user.
    #[error("login required to use the cart")]
    Unauthenticated,

    /// The change was applied in memory but could not be persisted.
    #[error("failed to persist cart: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Process-wide holder of the shopping cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

struct CartInner {
    storage: Arc<dyn ClientStorage>,
    backend: Arc<dyn CartBackend>,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<CartSnapshot>,
    /// Identity of the last completed load; `None` before the first one.
    loaded_for: watch::Sender<Option<Option<Identity>>>,
    generation: AtomicU64,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Remote change to replay after a local mutation.
#[derive(Debug, Clone, Copy)]
enum RemoteChange {
    Upsert(ProductId, u32),
    Decrease(ProductId),
    Clear,
}

impl CartStore {
    #[must_use]
    pub fn new(
        storage: Arc<dyn ClientStorage>,
        backend: Arc<dyn CartBackend>,
        session: SessionStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(CartSnapshot::default());
        let (loaded_for, _) = watch::channel(None);
        Self {
            inner: Arc::new(CartInner {
                storage,
                backend,
                session,
                notifier,
                state,
                loaded_for,
                generation: AtomicU64::new(0),
                pending: Mutex::new(Vec::new()),
            }),
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.inner.state.borrow().items.clone()
    }

    #[must_use]
    pub fn phase(&self) -> CartPhase {
        self.inner.state.borrow().phase
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.inner.state.borrow().totals()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.state.subscribe()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replace the items for `identity`.
    ///
    /// Signed-in users get their remote cart, which is then written to
    /// storage; if that fails, or for anonymous visitors, the stored local
    /// copy is used as is.
    #[instrument(skip_all, fields(user_id = identity.map(|i| i.id.as_i64())))]
    pub async fn load(&self, identity: Option<&Identity>) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner
            .state
            .send_modify(|snapshot| snapshot.phase = CartPhase::Loading);

        let token = identity.and(self.inner.session.get_token());
        let (items, remote) = match token {
            Some(token) => match self.inner.backend.fetch_cart(&token).await {
                Ok(lines) => {
                    debug!(lines = lines.len(), "Loaded remote cart");
                    (lines.into_iter().map(CartItem::from).collect(), true)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load remote cart, using local copy");
                    (stored_items(self.inner.storage.as_ref()), false)
                }
            },
            None => (stored_items(self.inner.storage.as_ref()), false),
        };

        if self.inner.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding superseded cart load");
            return;
        }

        self.inner.loaded_for.send_replace(Some(identity.cloned()));
        self.inner.state.send_replace(CartSnapshot {
            items,
            phase: CartPhase::Ready,
        });
        if remote && let Err(e) = self.persist() {
            warn!(error = %e, "Failed to persist loaded cart");
        }
    }

    /// Reload whenever the session identity changes.
    ///
    /// The returned task runs until the session holder is dropped or the
    /// handle is aborted.
    #[must_use]
    pub fn follow_session(&self) -> JoinHandle<()> {
        let cart = self.clone();
        let mut rx = self.inner.session.subscribe();
        tokio::spawn(async move {
            loop {
                let state = rx.borrow_and_update().clone();
                if !state.is_loading && !cart.is_loaded_for(state.identity.as_ref()) {
                    cart.load(state.identity.as_ref()).await;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Wait until the items belong to the session's current identity.
    ///
    /// Only returns once something (usually [`Self::follow_session`]) has
    /// loaded the cart for that identity.
    pub async fn caught_up(&self) {
        let mut session = self.inner.session.subscribe();
        let mut loaded = self.inner.loaded_for.subscribe();
        loop {
            let state = session.borrow_and_update().clone();
            let current = loaded
                .borrow_and_update()
                .as_ref()
                .is_some_and(|l| l.as_ref() == state.identity.as_ref());
            if !state.is_loading && current {
                return;
            }
            tokio::select! {
                changed = session.changed() => if changed.is_err() { return },
                changed = loaded.changed() => if changed.is_err() { return },
            }
        }
    }

    fn is_loaded_for(&self, identity: Option<&Identity>) -> bool {
        self.inner
            .loaded_for
            .borrow()
            .as_ref()
            .is_some_and(|l| l.as_ref() == identity)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `item`'s product.
    ///
    /// Anonymous visitors are sent to `/login` instead. Returns the new
    /// quantity of the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotReady` before the first load,
    /// `CartError::Unauthenticated` for anonymous visitors and
    /// `CartError::Storage` if the change could not be persisted.
    #[instrument(skip_all, fields(product_id = %item.id))]
    pub fn add_to_cart(&self, item: &CartItem) -> Result<u32, CartError> {
        self.ensure_ready()?;

        if self.inner.session.identity().is_none() {
            self.inner
                .notifier
                .notify(Notice::destructive("Login to use the cart"));
            self.inner
                .session
                .go(Navigation::Assign(guard::LOGIN_PATH.to_string()));
            return Err(CartError::Unauthenticated);
        }

        let mut quantity = 1;
        self.inner.state.send_modify(|snapshot| {
            if let Some(line) = snapshot.items.iter_mut().find(|line| line.id == item.id) {
                line.quantity += 1;
                quantity = line.quantity;
            } else {
                snapshot.items.push(CartItem {
                    quantity: 1,
                    ..item.clone()
                });
            }
        });

        self.persist()?;
        self.sync(RemoteChange::Upsert(item.id, quantity));
        self.inner.notifier.notify(
            Notice::info("Added to cart")
                .with_description(format!("{} has been added to your cart.", item.name)),
        );
        Ok(quantity)
    }

    /// Take one unit of `product_id` out; the line goes away at zero.
    ///
    /// Returns the remaining quantity. Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotReady` before the first load and
    /// `CartError::Storage` if the change could not be persisted.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn remove_from_cart(&self, product_id: ProductId) -> Result<u32, CartError> {
        self.ensure_ready()?;

        let mut remaining = None;
        self.inner.state.send_if_modified(|snapshot| {
            let Some(index) = snapshot.items.iter().position(|line| line.id == product_id) else {
                return false;
            };
            match snapshot.items.get_mut(index) {
                Some(line) if line.quantity > 1 => {
                    line.quantity -= 1;
                    remaining = Some(line.quantity);
                }
                _ => {
                    snapshot.items.remove(index);
                    remaining = Some(0);
                }
            }
            true
        });

        let Some(remaining) = remaining else {
            debug!("Product not in cart");
            return Ok(0);
        };

        self.persist()?;
        self.sync(RemoteChange::Decrease(product_id));
        Ok(remaining)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotReady` before the first load and
    /// `CartError::Storage` if the change could not be persisted.
    #[instrument(skip(self))]
    pub fn clear_cart(&self) -> Result<(), CartError> {
        self.ensure_ready()?;
        self.inner
            .state
            .send_modify(|snapshot| snapshot.items.clear());
        self.persist()?;
        self.sync(RemoteChange::Clear);
        Ok(())
    }

    /// Wait until every remote sync issued so far has finished.
    pub async fn settle(&self) {
        loop {
            let pending = std::mem::take(&mut *lock(&self.inner.pending));
            if pending.is_empty() {
                break;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Cart sync task failed");
                }
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_ready(&self) -> Result<(), CartError> {
        if self.phase() == CartPhase::Ready && self.is_loaded_for(self.inner.session.identity().as_ref()) {
            Ok(())
        } else {
            Err(CartError::NotReady)
        }
    }

    fn persist(&self) -> Result<(), CartError> {
        let (items, membership) = {
            let snapshot = self.inner.state.borrow();
            (
                serde_json::to_string(&snapshot.items)?,
                serde_json::to_string(&snapshot.membership())?,
            )
        };
        self.inner.storage.set(keys::CART, &items)?;
        self.inner.storage.set(keys::CART_SET, &membership)?;
        Ok(())
    }

    fn sync(&self, change: RemoteChange) {
        if self.inner.session.identity().is_none() {
            return;
        }
        let Some(token) = self.inner.session.get_token() else {
            return;
        };

        let backend = Arc::clone(&self.inner.backend);
        let handle = tokio::spawn(async move {
            if let Err(e) = apply(backend.as_ref(), &token, change).await {
                warn!(error = %e, ?change, "Failed to sync cart change");
            }
        });

        let mut pending = lock(&self.inner.pending);
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
    }
}

async fn apply(
    backend: &dyn CartBackend,
    token: &SecretString,
    change: RemoteChange,
) -> Result<(), crate::api::ApiError> {
    match change {
        RemoteChange::Upsert(product_id, quantity) => backend.upsert_line(token, product_id, quantity).await,
        RemoteChange::Decrease(product_id) => backend.decrease_line(token, product_id).await,
        RemoteChange::Clear => backend.clear(token).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stoneart_core::{ImageRefs, Price};

    use super::*;
    use crate::navigation::History;
    use crate::notice::NoticeLog;
    use crate::storage::MemoryStorage;
    use crate::testing::{FakeCartBackend, FakeSessionBackend, RemoteCall, token_for};

    struct Harness {
        storage: Arc<MemoryStorage>,
        history: Arc<History>,
        notices: Arc<NoticeLog>,
        remote: Arc<FakeCartBackend>,
        session: SessionStore,
        cart: CartStore,
    }

    fn harness(remote: FakeCartBackend) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let history = Arc::new(History::new());
        let notices = Arc::new(NoticeLog::new());
        let remote = Arc::new(remote);
        let session = SessionStore::new(
            storage.clone(),
            Arc::new(FakeSessionBackend::accepting()),
            history.clone(),
            notices.clone(),
        );
        let cart = CartStore::new(storage.clone(), remote.clone(), session.clone(), notices.clone());
        Harness {
            storage,
            history,
            notices,
            remote,
            session,
            cart,
        }
    }

    async fn signed_in(remote: FakeCartBackend) -> Harness {
        let h = harness(remote);
        h.storage
            .set(
                keys::TOKEN,
                &token_for(&json!({"id": 3, "name": "Ravi", "email": "ravi@example.com", "role": "user"})),
            )
            .unwrap();
        h.session.initialize();
        h.cart.load(h.session.identity().as_ref()).await;
        h
    }

    fn item(id: i64) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Carving {id}"),
            price: Price::parse("1200").unwrap(),
            image_urls: ImageRefs::default(),
            quantity: 1,
        }
    }

    #[tokio::test]
    async fn test_mutations_before_load_are_rejected() {
        let h = harness(FakeCartBackend::default());
        assert_eq!(h.cart.phase(), CartPhase::Uninitialized);
        assert!(matches!(h.cart.add_to_cart(&item(1)), Err(CartError::NotReady)));
        assert!(matches!(h.cart.remove_from_cart(ProductId::new(1)), Err(CartError::NotReady)));
        assert!(matches!(h.cart.clear_cart(), Err(CartError::NotReady)));
    }

    #[tokio::test]
    async fn test_anonymous_add_redirects_to_login() {
        let h = harness(FakeCartBackend::default());
        h.session.initialize();
        h.cart.load(None).await;

        let err = h.cart.add_to_cart(&item(1)).unwrap_err();
        assert!(matches!(err, CartError::Unauthenticated));
        assert!(h.cart.items().is_empty());
        assert_eq!(h.history.last(), Some(Navigation::Assign("/login".to_string())));
        assert_eq!(h.notices.titles(), vec!["Login to use the cart"]);
        assert!(h.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_quantity_tracks_net_adds_and_removes() {
        let h = signed_in(FakeCartBackend::default()).await;
        let x = item(5);

        let ops = [true, true, false, true, false, false, false, true];
        let mut net: i32 = 0;
        for add in ops {
            if add {
                h.cart.add_to_cart(&x).unwrap();
                net += 1;
            } else {
                h.cart.remove_from_cart(x.id).unwrap();
                net = (net - 1).max(0);
            }
            let quantity = h.cart.snapshot().quantity_of(x.id);
            assert_eq!(i32::try_from(quantity).unwrap(), net);
            assert_eq!(h.cart.snapshot().contains(x.id), net >= 1);
        }
    }

    #[tokio::test]
    async fn test_remote_sync_sends_resulting_quantity() {
        let h = signed_in(FakeCartBackend::default()).await;

        h.cart.add_to_cart(&item(2)).unwrap();
        h.cart.settle().await;
        h.cart.add_to_cart(&item(2)).unwrap();
        h.cart.settle().await;
        h.cart.remove_from_cart(ProductId::new(2)).unwrap();
        h.cart.settle().await;
        h.cart.remove_from_cart(ProductId::new(99)).unwrap();
        h.cart.clear_cart().unwrap();
        h.cart.settle().await;

        assert_eq!(
            h.remote.calls(),
            vec![
                RemoteCall::Fetch,
                RemoteCall::Upsert(ProductId::new(2), 1),
                RemoteCall::Upsert(ProductId::new(2), 2),
                RemoteCall::Decrease(ProductId::new(2)),
                RemoteCall::Clear,
            ]
        );
        assert_eq!(h.notices.titles(), vec!["Added to cart", "Added to cart"]);
    }

    #[tokio::test]
    async fn test_sync_failures_do_not_roll_back() {
        let h = signed_in(FakeCartBackend::failing_writes()).await;
        h.cart.add_to_cart(&item(1)).unwrap();
        h.cart.settle().await;
        assert_eq!(h.cart.snapshot().quantity_of(ProductId::new(1)), 1);
    }

    #[tokio::test]
    async fn test_clear_empties_items_and_membership() {
        let h = signed_in(FakeCartBackend::default()).await;
        h.cart.add_to_cart(&item(1)).unwrap();
        h.cart.add_to_cart(&item(2)).unwrap();

        h.cart.clear_cart().unwrap();

        assert!(h.cart.snapshot().is_empty());
        assert!(h.cart.snapshot().membership().is_empty());
        assert_eq!(h.storage.get(keys::CART).unwrap().as_deref(), Some("[]"));
        assert_eq!(h.storage.get(keys::CART_SET).unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_storage_round_trip_across_sessions() {
        let h = signed_in(FakeCartBackend::unreachable()).await;
        h.cart.add_to_cart(&item(1)).unwrap();
        h.cart.add_to_cart(&item(1)).unwrap();
        h.cart.add_to_cart(&item(4)).unwrap();
        let before: BTreeMap<_, _> = h.cart.items().into_iter().map(|i| (i.id, i)).collect();

        let fresh = CartStore::new(
            h.storage.clone(),
            Arc::new(FakeCartBackend::unreachable()),
            h.session.clone(),
            Arc::new(NoticeLog::new()),
        );
        fresh.load(h.session.identity().as_ref()).await;
        let after: BTreeMap<_, _> = fresh.items().into_iter().map(|i| (i.id, i)).collect();

        assert_eq!(before, after);
        assert_eq!(
            stored_membership(h.storage.as_ref()),
            [ProductId::new(1), ProductId::new(4)].into_iter().collect()
        );
    }

    #[tokio::test]
    async fn test_remote_cart_replaces_local_copy() {
        let remote = FakeCartBackend::with_lines(json!([
            {"product_id": 8, "name": "Torso", "price": "300", "image_urls": "[]", "quantity": 2}
        ]));
        let h = harness(remote);
        h.storage.set(keys::CART, &serde_json::to_string(&[item(1)]).unwrap()).unwrap();
        h.storage
            .set(
                keys::TOKEN,
                &token_for(&json!({"id": 3, "name": "Ravi", "email": "ravi@example.com", "role": "user"})),
            )
            .unwrap();
        h.session.initialize();

        h.cart.load(h.session.identity().as_ref()).await;

        let items = h.cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, ProductId::new(8));
        assert_eq!(items[0].quantity, 2);
        assert_eq!(h.storage.get(keys::CART_SET).unwrap().as_deref(), Some("[8]"));
    }

    #[tokio::test]
    async fn test_follow_session_reloads_on_logout() {
        let h = signed_in(FakeCartBackend::default()).await;
        h.cart.add_to_cart(&item(1)).unwrap();
        let follower = h.cart.follow_session();

        h.session.logout();
        let mut rx = h.cart.subscribe();
        rx.wait_for(|snapshot| snapshot.phase == CartPhase::Ready && snapshot.items.is_empty())
            .await
            .unwrap();

        follower.abort();
    }

    #[tokio::test]
    async fn test_mutations_wait_for_reload_after_identity_change() {
        let h = signed_in(FakeCartBackend::default()).await;
        h.cart.add_to_cart(&item(1)).unwrap();

        h.session.logout();
        assert!(matches!(
            h.cart.remove_from_cart(ProductId::new(1)),
            Err(CartError::NotReady)
        ));
        assert_eq!(h.storage.get(keys::CART).unwrap(), None);

        let follower = h.cart.follow_session();
        h.cart.caught_up().await;
        assert!(h.cart.items().is_empty());
        assert_eq!(h.cart.remove_from_cart(ProductId::new(1)).unwrap(), 0);
        assert_eq!(h.storage.get(keys::CART).unwrap(), None);

        follower.abort();
    }
}
