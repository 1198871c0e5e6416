//! Remote calls the cart holder depends on.

use async_trait::async_trait;
use secrecy::SecretString;
use stoneart_core::ProductId;

use crate::api::{ApiClient, ApiError, RemoteCartLine};

/// The per-user remote cart.
#[async_trait]
pub trait CartBackend: Send + Sync {
    async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<RemoteCartLine>, ApiError>;

    /// Set the remote quantity of `product_id`.
    async fn upsert_line(
        &self,
        token: &SecretString,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError>;

    /// Decrease the remote quantity of `product_id` by one.
    async fn decrease_line(&self, token: &SecretString, product_id: ProductId)
    -> Result<(), ApiError>;

    async fn clear(&self, token: &SecretString) -> Result<(), ApiError>;
}

#[async_trait]
impl CartBackend for ApiClient {
    async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<RemoteCartLine>, ApiError> {
        Self::fetch_cart(self, token).await
    }

    async fn upsert_line(
        &self,
        token: &SecretString,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.upsert_cart_line(token, product_id, quantity).await
    }

    async fn decrease_line(
        &self,
        token: &SecretString,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        self.decrease_cart_line(token, product_id).await
    }

    async fn clear(&self, token: &SecretString) -> Result<(), ApiError> {
        self.clear_remote_cart(token).await
    }
}
