//! Token verification and admin credential exchange.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};
use url::Url;

use super::{AdminLoginRequest, AdminLoginResponse, ApiClient, ApiError};

impl ApiClient {
    /// Ask the backend whether `token` is still valid.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or any non-success status.
    #[instrument(skip(self, token))]
    pub async fn verify_token(&self, token: &SecretString) -> Result<(), ApiError> {
        let url = self.endpoint("/token")?;
        self.send(self.request(Method::GET, url, Some(token)))
            .await?;
        debug!("Token verified");
        Ok(())
    }

    /// Exchange admin credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, any non-success status, or an
    /// answer without a token.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn admin_login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SecretString, ApiError> {
        let url = self.endpoint("/auth/admin/login")?;
        let body = AdminLoginRequest {
            email,
            password: password.expose_secret(),
        };
        let response: AdminLoginResponse = self
            .send_json(Method::POST, url, &body, None)
            .await?;
        Ok(response.into())
    }

    /// Entry point of the customer OAuth flow.
    ///
    /// The identity provider eventually redirects back to the storefront
    /// landing page with the token in a `jwt` query parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL does not parse.
    pub fn oauth_entry_url(&self) -> Result<Url, ApiError> {
        self.endpoint("/auth/google")
    }
}
