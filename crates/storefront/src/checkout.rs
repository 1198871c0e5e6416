//! Checkout flow.
//!
//! - An empty cart sends the visitor back to `/products`
//! - Anonymous visitors are handed to the OAuth entry point, with
//!   `/checkout` recorded as where to come back to
//! - A placed order clears the cart and lands on `/settings`

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use tracing::{error, info, instrument};
use url::Url;

use crate::api::{ApiClient, ApiError, CheckoutReceipt, Order, Profile};
use crate::cart::{CartError, CartPhase, CartStore, CartTotals};
use crate::navigation::Navigation;
use crate::notice::{Notice, Notifier};
use crate::session::{SessionError, SessionStore};

pub const CHECKOUT_PATH: &str = "/checkout";
pub const PRODUCTS_PATH: &str = "/products";
pub const ORDER_PLACED_PATH: &str = "/settings";

/// Order and account endpoints.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn checkout(&self, token: &SecretString) -> Result<CheckoutReceipt, ApiError>;

    async fn order_history(&self, token: &SecretString) -> Result<Vec<Order>, ApiError>;

    async fn profile(&self, token: &SecretString) -> Result<Profile, ApiError>;
}

#[async_trait]
impl OrderBackend for ApiClient {
    async fn checkout(&self, token: &SecretString) -> Result<CheckoutReceipt, ApiError> {
        Self::checkout(self, token).await
    }

    async fn order_history(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        Self::order_history(self, token).await
    }

    async fn profile(&self, token: &SecretString) -> Result<Profile, ApiError> {
        Self::profile(self, token).await
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("checkout failed: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Cart(#[from] CartError),
}

/// What placing the order led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The visitor must sign in first; this is where they were sent.
    RedirectedToLogin(Url),
    /// The order was accepted.
    Placed(CheckoutReceipt),
}

/// The checkout page.
pub struct Checkout {
    session: SessionStore,
    cart: CartStore,
    backend: Arc<dyn OrderBackend>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for Checkout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkout")
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}

impl Checkout {
    #[must_use]
    pub fn new(
        session: SessionStore,
        cart: CartStore,
        backend: Arc<dyn OrderBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            cart,
            backend,
            notifier,
        }
    }

    /// Visit `/checkout`; returns false if the visitor was sent away.
    pub fn enter(&self) -> bool {
        if self.session.visit(CHECKOUT_PATH) != CHECKOUT_PATH {
            return false;
        }
        let snapshot = self.cart.snapshot();
        if snapshot.phase == CartPhase::Ready && snapshot.is_empty() {
            self.session
                .go(Navigation::Push(PRODUCTS_PATH.to_string()));
            return false;
        }
        true
    }

    /// Order summary figures.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.cart.totals()
    }

    /// Turn the cart into an order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` (after redirecting to `/products`)
    /// for an empty cart and `CheckoutError::Api` (after a "Checkout failed"
    /// notice, cart untouched) if the backend refuses the order.
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<CheckoutOutcome, CheckoutError> {
        if self.cart.snapshot().is_empty() {
            self.session
                .go(Navigation::Push(PRODUCTS_PATH.to_string()));
            return Err(CheckoutError::EmptyCart);
        }

        let token = self
            .session
            .identity()
            .and_then(|_| self.session.get_token());
        let Some(token) = token else {
            info!("Anonymous checkout, handing off to sign-in");
            let url = self.session.begin_oauth(CHECKOUT_PATH)?;
            return Ok(CheckoutOutcome::RedirectedToLogin(url));
        };

        let receipt = match self.backend.checkout(&token).await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(error = %e, "Checkout failed");
                self.notifier.notify(
                    Notice::destructive("Checkout failed")
                        .with_description("Your cart has not been changed"),
                );
                return Err(e.into());
            }
        };

        info!("Order placed");
        self.cart.clear_cart()?;
        self.session
            .go(Navigation::Push(ORDER_PLACED_PATH.to_string()));
        Ok(CheckoutOutcome::Placed(receipt))
    }
}
