//! Checkout, order history and profile endpoints.

use reqwest::Method;
use secrecy::SecretString;
use tracing::instrument;

use super::{ApiClient, ApiError, CheckoutReceipt, Order, Profile};

impl ApiClient {
    /// Turn the signed-in user's remote cart into an order.
    ///
    /// An empty success body yields `CheckoutReceipt::Null`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn checkout(&self, token: &SecretString) -> Result<CheckoutReceipt, ApiError> {
        let url = self.endpoint("/orders/checkout")?;
        let request = self
            .request(Method::POST, url, Some(token))
            .json(&serde_json::json!({}));
        let text = self.send(request).await?.text().await?;
        if text.trim().is_empty() {
            return Ok(CheckoutReceipt::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Past orders of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn order_history(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint("/orders/history")?;
        self.get_json(url, Some(token)).await
    }

    /// Profile of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn profile(&self, token: &SecretString) -> Result<Profile, ApiError> {
        let url = self.endpoint("/profile")?;
        self.get_json(url, Some(token)).await
    }
}
