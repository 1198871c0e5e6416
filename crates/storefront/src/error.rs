//! Unified error type for storefront callers.
//!
//! Each module has its own error enum; `AppError` gathers them for code that
//! drives several modules at once (the CLI, [`crate::state::Storefront`]).

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::session::SessionError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Client storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Sign-in or sign-out failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Cart mutation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog listing failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),
}

/// Result type alias using `AppError`.
pub type Result<T, E = AppError> = std::result::Result<T, E>;
