//! Storefront state shared by every view.

use std::sync::{Arc, Mutex, PoisonError};

use stoneart_core::ProductId;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::api::{ApiClient, Product};
use crate::cart::{CartStore, stored_membership};
use crate::catalog::ProductFeed;
use crate::checkout::Checkout;
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::navigation::History;
use crate::notice::{NoticeLog, Notifier};
use crate::profile::ProfilePage;
use crate::session::SessionStore;
use crate::storage::{ClientStorage, FileStorage};

/// Number of products on the landing page.
pub const FEATURED_COUNT: u32 = 4;

/// A product page: the product and whether it is already in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetail {
    pub product: Product,
    pub in_cart: bool,
}

/// Wires the API client, client storage and both state holders together.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    api: ApiClient,
    storage: Arc<dyn ClientStorage>,
    history: Arc<History>,
    notices: Arc<NoticeLog>,
    session: SessionStore,
    cart: CartStore,
    /// Reloads the cart on sign-in and sign-out once [`Storefront::start`] ran.
    cart_follower: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StorefrontInner {
    fn drop(&mut self) {
        let follower = self
            .cart_follower
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = follower.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("api", &self.inner.api)
            .field("session", &self.inner.session)
            .field("cart", &self.inner.cart)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Build the storefront with file-backed storage under `state_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory cannot be created.
    pub fn new(config: StorefrontConfig) -> Result<Self, AppError> {
        let storage = Arc::new(FileStorage::open(config.storage_path())?);
        Ok(Self::with_storage(config, storage))
    }

    /// Build the storefront around an existing storage backend.
    #[must_use]
    pub fn with_storage(config: StorefrontConfig, storage: Arc<dyn ClientStorage>) -> Self {
        let api = ApiClient::new(config.api_url.clone());
        let history = Arc::new(History::new());
        let notices = Arc::new(NoticeLog::new());
        let backend = Arc::new(api.clone());

        let session = SessionStore::new(
            Arc::clone(&storage),
            backend.clone(),
            history.clone(),
            notices.clone(),
        );
        let cart = CartStore::new(
            Arc::clone(&storage),
            backend,
            session.clone(),
            notices.clone(),
        );

        Self {
            inner: Arc::new(StorefrontInner {
                config,
                api,
                storage,
                history,
                notices,
                session,
                cart,
                cart_follower: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn storage(&self) -> &dyn ClientStorage {
        self.inner.storage.as_ref()
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.inner.history
    }

    #[must_use]
    pub fn notices(&self) -> &NoticeLog {
        &self.inner.notices
    }

    /// The notice sink as a shareable handle.
    #[must_use]
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.inner.notices.clone()
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Restore the session, load the cart for it and keep the cart
    /// following later sign-ins and sign-outs.
    ///
    /// Waits for the stored token to be verified so one-shot callers see
    /// the settled session.
    #[instrument(skip(self))]
    pub async fn start(&self) {
        self.inner.session.initialize();
        self.inner.session.settle().await;
        self.inner
            .cart
            .load(self.inner.session.identity().as_ref())
            .await;

        let mut follower = self
            .inner
            .cart_follower
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if follower.is_none() {
            *follower = Some(self.inner.cart.follow_session());
        }
    }

    fn is_following(&self) -> bool {
        self.inner
            .cart_follower
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Wait for outstanding background work: token verification, the cart
    /// reload after an identity change and cart syncs.
    pub async fn settle(&self) {
        self.inner.session.settle().await;
        if self.is_following() {
            self.inner.cart.caught_up().await;
        }
        self.inner.cart.settle().await;
    }

    /// A fresh catalog listing using the configured page size.
    #[must_use]
    pub fn product_feed(&self) -> ProductFeed {
        ProductFeed::new(
            Arc::new(self.inner.api.clone()),
            self.inner.notices.clone(),
            self.inner.config.page_size,
        )
    }

    #[must_use]
    pub fn checkout(&self) -> Checkout {
        Checkout::new(
            self.inner.session.clone(),
            self.inner.cart.clone(),
            Arc::new(self.inner.api.clone()),
            self.inner.notices.clone(),
        )
    }

    /// Profile page for the current session.
    pub async fn profile_page(&self) -> ProfilePage {
        ProfilePage::load(&self.inner.session, &self.inner.api, self.inner.notices.as_ref()).await
    }

    /// Landing page products.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    pub async fn featured_products(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.inner.api.featured_products(FEATURED_COUNT).await?)
    }

    /// Product page data.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be fetched or does not exist.
    pub async fn product_detail(&self, id: ProductId) -> Result<ProductDetail, AppError> {
        let product = self.inner.api.product(id).await?;
        let in_cart = stored_membership(self.storage()).contains(&id);
        Ok(ProductDetail { product, in_cart })
    }
}
