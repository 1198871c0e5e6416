//! Command implementations, one module per area.

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;

use stoneart_admin::AdminError;
use stoneart_storefront::error::AppError;
use thiserror::Error;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Storefront(#[from] AppError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    /// Admin commands were run without an admin session.
    #[error("Admin login required (stoneart login admin -e <email> -p <password>)")]
    NotAdmin,
}

/// Shorthand for converting a module error into `CliError` via `AppError`.
pub fn app<E: Into<AppError>>(err: E) -> CliError {
    CliError::Storefront(err.into())
}
