//! Session state holder.
//!
//! # Architecture
//!
//! - The only persisted credential is the bearer token in [`ClientStorage`]
//! - The token payload is decoded locally (unverified) into an [`Identity`]
//!   so the storefront can render optimistically
//! - A background `GET /token` confirms the token; any failure, like a
//!   payload that does not decode, wipes the session and the cart and sends
//!   the user back to `/`
//! - Subscribers observe [`SessionState`] through a `tokio::sync::watch`
//!   channel; the cart holder reloads whenever the identity changes
//!
//! The decoded role is a presentation hint. The backend re-checks every
//! privileged call.

mod backend;
pub mod guard;
mod token;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use backend::SessionBackend;
pub use guard::guard;
pub use token::{Identity, TokenError, decode_identity};

use crate::api::ApiError;
use crate::navigation::{Navigation, Navigator};
use crate::notice::{Notice, Notifier};
use crate::storage::{ClientStorage, StorageError, keys};

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid authentication token: {0}")]
    Token(#[from] TokenError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Decoded identity, `None` when anonymous.
    pub identity: Option<Identity>,
    /// True until [`SessionStore::initialize`] has read the stored token.
    pub is_loading: bool,
}

impl SessionState {
    const fn loading() -> Self {
        Self {
            identity: None,
            is_loading: true,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity.as_ref().is_some_and(Identity::is_admin)
    }
}

/// Process-wide holder of "who is signed in".
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    storage: Arc<dyn ClientStorage>,
    backend: Arc<dyn SessionBackend>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<SessionState>,
    location: Mutex<String>,
    verification: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.inner.state.borrow())
            .field("location", &*lock(&self.inner.location))
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionStore {
    /// Create a holder in the loading state.
    #[must_use]
    pub fn new(
        storage: Arc<dyn ClientStorage>,
        backend: Arc<dyn SessionBackend>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::loading());
        Self {
            inner: Arc::new(SessionInner {
                storage,
                backend,
                navigator,
                notifier,
                state,
                location: Mutex::new(guard::HOME_PATH.to_string()),
                verification: Mutex::new(None),
            }),
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Current identity, if signed in.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.borrow().identity.clone()
    }

    /// Receive every subsequent state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Path the user is currently on.
    #[must_use]
    pub fn location(&self) -> String {
        lock(&self.inner.location).clone()
    }

    /// Stored bearer token, if any.
    #[must_use]
    pub fn get_token(&self) -> Option<SecretString> {
        match self.inner.storage.get(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()).map(SecretString::from),
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    /// Path recorded by [`Self::begin_oauth`], if any.
    #[must_use]
    pub fn redirect_after_login(&self) -> Option<String> {
        self.inner
            .storage
            .get(keys::REDIRECT_AFTER_LOGIN)
            .ok()
            .flatten()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Read the stored token and restore the session from it.
    ///
    /// A decodable token signs the user in immediately and starts a
    /// background verification. Must be called inside a Tokio runtime.
    #[instrument(skip(self))]
    pub fn initialize(&self) {
        let Some(token) = self.get_token() else {
            debug!("No stored token, anonymous session");
            self.publish(None);
            self.enforce_guard();
            return;
        };

        match decode_identity(token.expose_secret()) {
            Ok(identity) => {
                info!(user_id = %identity.id, role = %identity.role, "Restored session");
                self.publish(Some(identity));
                self.spawn_verification(token);
                self.enforce_guard();
            }
            Err(e) => {
                warn!(error = %e, "Stored token does not decode, resetting session");
                self.reset();
            }
        }
    }

    /// Wait for the background token verification, if one is running.
    pub async fn settle(&self) {
        let handle = lock(&self.inner.verification).take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Token verification task failed");
        }
    }

    fn spawn_verification(&self, token: SecretString) {
        let store = self.clone();
        let handle = tokio::spawn(async move {
            match store.inner.backend.verify_token(&token).await {
                Ok(()) => debug!("Stored token accepted"),
                Err(e) => {
                    warn!(error = %e, "Token verification failed, resetting session");
                    store.reset();
                }
            }
        });
        if let Some(previous) = lock(&self.inner.verification).replace(handle) {
            previous.abort();
        }
    }

    /// Wipe token, cart and redirect storage, sign out and hard-navigate home.
    fn reset(&self) {
        let storage = &self.inner.storage;
        let results = [
            storage.remove(keys::TOKEN),
            storage.set(keys::CART, "[]"),
            storage.set(keys::CART_SET, "[]"),
            storage.remove(keys::REDIRECT_AFTER_LOGIN),
        ];
        for result in results {
            if let Err(e) = result {
                warn!(error = %e, "Failed to clear session storage");
            }
        }
        self.publish(None);
        self.go(Navigation::Assign(guard::HOME_PATH.to_string()));
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Sign in with a bearer token.
    ///
    /// Admins land on `/admin`, everyone else on `/`. A token that does not
    /// decode raises an "Authentication Error" notice and leaves the current
    /// session untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Token` if the payload does not decode and
    /// `SessionError::Storage` if the token cannot be persisted.
    #[instrument(skip_all)]
    pub fn login(&self, token: &str) -> Result<Identity, SessionError> {
        let identity = match decode_identity(token) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Rejected login token");
                self.inner.notifier.notify(
                    Notice::destructive("Authentication Error")
                        .with_description("Invalid authentication token"),
                );
                return Err(e.into());
            }
        };

        self.inner.storage.set(keys::TOKEN, token.trim())?;
        info!(user_id = %identity.id, role = %identity.role, "Signed in");
        self.publish(Some(identity.clone()));

        let home = if identity.is_admin() { "/admin" } else { guard::HOME_PATH };
        self.go(Navigation::Push(home.to_string()));
        Ok(identity)
    }

    /// Exchange admin credentials for a token and sign in with it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` (after a "Login Failed" notice) if the
    /// backend rejects the credentials or cannot be reached, and whatever
    /// [`Self::login`] returns otherwise.
    #[instrument(skip(self, password))]
    pub async fn admin_login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, SessionError> {
        let token = match self.inner.backend.admin_login(email, password).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Admin login failed");
                self.inner.notifier.notify(
                    Notice::destructive("Login Failed").with_description("Invalid email or password"),
                );
                return Err(e.into());
            }
        };
        self.login(token.expose_secret())
    }

    /// Sign out, wipe stored session and cart data and hard-navigate home.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        for key in [
            keys::TOKEN,
            keys::CART,
            keys::CART_SET,
            keys::REDIRECT_AFTER_LOGIN,
        ] {
            if let Err(e) = self.inner.storage.remove(key) {
                warn!(error = %e, key, "Failed to clear storage on logout");
            }
        }
        if let Some(handle) = lock(&self.inner.verification).take() {
            handle.abort();
        }
        info!("Signed out");
        self.publish(None);
        self.go(Navigation::Assign(guard::HOME_PATH.to_string()));
    }

    // =========================================================================
    // OAuth
    // =========================================================================

    /// Customer sign-in entry point on the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn oauth_entry_url(&self) -> Result<Url, ApiError> {
        self.inner.backend.oauth_entry_url()
    }

    /// Remember `return_to` and hand off to the OAuth entry point.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the URL cannot be built.
    #[instrument(skip(self))]
    pub fn begin_oauth(&self, return_to: &str) -> Result<Url, SessionError> {
        self.inner
            .storage
            .set(keys::REDIRECT_AFTER_LOGIN, return_to)?;
        let url = self.oauth_entry_url()?;
        self.go(Navigation::Assign(url.to_string()));
        Ok(url)
    }

    /// Consume the `jwt` parameter of the OAuth landing URL.
    ///
    /// The token is persisted and the session restored from it as on start
    /// up; the user then lands on the recorded post-login path (or `/`).
    /// Returns `None` when the URL carries no token.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the token cannot be persisted.
    #[instrument(skip_all)]
    pub fn complete_oauth(&self, landing: &Url) -> Result<Option<Identity>, SessionError> {
        let Some(jwt) = landing
            .query_pairs()
            .find(|(key, _)| key == "jwt")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
        else {
            return Ok(None);
        };

        self.inner.storage.set(keys::TOKEN, &jwt)?;
        self.initialize();

        let Some(identity) = self.identity() else {
            return Ok(None);
        };

        let target = self
            .redirect_after_login()
            .unwrap_or_else(|| guard::HOME_PATH.to_string());
        self.inner.storage.remove(keys::REDIRECT_AFTER_LOGIN)?;
        self.go(Navigation::Assign(target));
        self.enforce_guard();
        Ok(Some(identity))
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Move to `path`, applying the route guards.
    ///
    /// Returns the path the user actually ends up on.
    pub fn visit(&self, path: &str) -> String {
        self.go(Navigation::Push(path.to_string()));
        self.enforce_guard();
        self.location()
    }

    /// Record a navigation and forward it to the view layer.
    pub fn go(&self, to: Navigation) {
        *lock(&self.inner.location) = to.path().to_string();
        self.inner.navigator.navigate(to);
    }

    fn enforce_guard(&self) -> Option<&'static str> {
        let path = self.location();
        let redirect = guard(&path, &self.inner.state.borrow());
        if let Some(to) = redirect {
            debug!(from = %path, to, "Route guard redirect");
            self.go(Navigation::Push(to.to_string()));
        }
        redirect
    }

    fn publish(&self, identity: Option<Identity>) {
        self.inner.state.send_replace(SessionState {
            identity,
            is_loading: false,
        });
    }
}
