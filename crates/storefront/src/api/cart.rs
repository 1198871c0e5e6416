//! Remote per-user cart endpoints.

use reqwest::Method;
use secrecy::SecretString;
use stoneart_core::ProductId;
use tracing::instrument;

use super::{ApiClient, ApiError, CartQuantityChange, CartUpsert, QuantityAction, RemoteCartLine};

impl ApiClient {
    /// Fetch the signed-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<RemoteCartLine>, ApiError> {
        let url = self.endpoint("/cart")?;
        self.get_json(url, Some(token)).await
    }

    /// Set the quantity of one product in the remote cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn upsert_cart_line(
        &self,
        token: &SecretString,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let url = self.endpoint("/cart")?;
        let body = CartUpsert {
            product_id,
            quantity,
        };
        self.send_json_unit(Method::POST, url, &body, Some(token))
            .await
    }

    /// Decrease the quantity of one product in the remote cart by one.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn decrease_cart_line(
        &self,
        token: &SecretString,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint("/cart/quantity")?;
        let body = CartQuantityChange {
            product_id,
            action: QuantityAction::Decrease,
        };
        self.send_json_unit(Method::PUT, url, &body, Some(token))
            .await
    }

    /// Delete every line of the remote cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn clear_remote_cart(&self, token: &SecretString) -> Result<(), ApiError> {
        let url = self.endpoint("/cart")?;
        self.send(self.request(Method::DELETE, url, Some(token)))
            .await
            .map(drop)
    }
}
