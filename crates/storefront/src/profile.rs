//! The signed-in customer's profile page.

use tracing::{instrument, warn};

use crate::api::{Order, Profile};
use crate::checkout::OrderBackend;
use crate::notice::{Notice, Notifier};
use crate::session::SessionStore;

/// Profile details and order history.
///
/// Either half falls back to empty data when it cannot be fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePage {
    pub profile: Option<Profile>,
    pub orders: Vec<Order>,
}

impl ProfilePage {
    /// Fetch the page for the current session.
    ///
    /// Anonymous visitors get an empty page; the route guard has already
    /// sent them to `/login`.
    #[instrument(skip_all)]
    pub async fn load(
        session: &SessionStore,
        backend: &dyn OrderBackend,
        notifier: &dyn Notifier,
    ) -> Self {
        let Some(token) = session.identity().and_then(|_| session.get_token()) else {
            return Self::default();
        };

        let (profile, orders) =
            tokio::join!(backend.profile(&token), backend.order_history(&token));

        let profile = profile
            .inspect_err(|e| {
                warn!(error = %e, "Failed to load profile");
                notifier.notify(
                    Notice::destructive("Failed to load profile")
                        .with_description("Server is not responding"),
                );
            })
            .ok();

        let orders = orders
            .inspect_err(|e| {
                warn!(error = %e, "Failed to load order history");
                notifier.notify(
                    Notice::destructive("Failed to load order history")
                        .with_description("Server is not responding"),
                );
            })
            .unwrap_or_default();

        Self { profile, orders }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;
    use crate::api::{ApiError, CheckoutReceipt};
    use crate::navigation::History;
    use crate::notice::NoticeLog;
    use crate::storage::{ClientStorage, MemoryStorage, keys};
    use crate::testing::{FakeSessionBackend, token_for};

    struct Account;

    #[async_trait]
    impl OrderBackend for Account {
        async fn checkout(&self, _token: &SecretString) -> Result<CheckoutReceipt, ApiError> {
            Ok(CheckoutReceipt::Null)
        }

        async fn order_history(&self, _token: &SecretString) -> Result<Vec<Order>, ApiError> {
            Err(ApiError::Status {
                status: 503,
                body: String::new(),
            })
        }

        async fn profile(&self, _token: &SecretString) -> Result<Profile, ApiError> {
            Ok(serde_json::from_value(json!({
                "name": "Devika",
                "email": "devika@example.com",
                "created_at": "2024-05-01T10:00:00Z"
            }))?)
        }
    }

    fn session(storage: Arc<MemoryStorage>) -> SessionStore {
        SessionStore::new(
            storage,
            Arc::new(FakeSessionBackend::accepting()),
            Arc::new(History::new()),
            Arc::new(NoticeLog::new()),
        )
    }

    #[tokio::test]
    async fn test_partial_failure_falls_back_to_empty_orders() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                keys::TOKEN,
                &token_for(&json!({"id": 2, "name": "Devika", "email": "devika@example.com", "role": "user"})),
            )
            .unwrap();
        let session = session(storage);
        session.initialize();
        let notices = NoticeLog::new();

        let page = ProfilePage::load(&session, &Account, &notices).await;

        assert_eq!(page.profile.unwrap().name, "Devika");
        assert!(page.orders.is_empty());
        assert_eq!(notices.titles(), vec!["Failed to load order history"]);
    }

    #[tokio::test]
    async fn test_anonymous_gets_empty_page() {
        let session = session(Arc::new(MemoryStorage::new()));
        session.initialize();
        let notices = NoticeLog::new();

        let page = ProfilePage::load(&session, &Account, &notices).await;
        assert_eq!(page, ProfilePage::default());
        assert!(notices.titles().is_empty());
    }
}
