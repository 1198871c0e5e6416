//! Remote calls the session holder depends on.

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use crate::api::{ApiClient, ApiError};

/// Token verification and admin credential exchange.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Succeeds iff the backend still accepts `token`.
    async fn verify_token(&self, token: &SecretString) -> Result<(), ApiError>;

    /// Exchange admin credentials for a bearer token.
    async fn admin_login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SecretString, ApiError>;

    /// Where customer sign-in starts.
    fn oauth_entry_url(&self) -> Result<Url, ApiError>;
}

#[async_trait]
impl SessionBackend for ApiClient {
    async fn verify_token(&self, token: &SecretString) -> Result<(), ApiError> {
        Self::verify_token(self, token).await
    }

    async fn admin_login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SecretString, ApiError> {
        Self::admin_login(self, email, password).await
    }

    fn oauth_entry_url(&self) -> Result<Url, ApiError> {
        Self::oauth_entry_url(self)
    }
}
