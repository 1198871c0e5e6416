//! Error type for admin operations.

use std::path::PathBuf;

use stoneart_storefront::api::ApiError;
use stoneart_storefront::notice::Notice;
use thiserror::Error;

/// Errors raised by admin forms and calls.
#[derive(Debug, Error)]
pub enum AdminError {
    /// A form failed validation; nothing was sent.
    #[error("{title}: {description}")]
    Invalid {
        title: &'static str,
        description: &'static str,
    },

    /// No token is stored.
    #[error("Unauthorized: admin login required")]
    Unauthenticated,

    /// Backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// An image file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A multipart part could not be built.
    #[error("Invalid upload: {0}")]
    Upload(#[from] reqwest::Error),
}

impl AdminError {
    pub(crate) const fn invalid(title: &'static str, description: &'static str) -> Self {
        Self::Invalid { title, description }
    }

    /// The notice shown for a validation failure, if this is one.
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Invalid { title, description } => {
                Some(Notice::destructive(*title).with_description(*description))
            }
            _ => None,
        }
    }
}

/// Result type alias using `AdminError`.
pub type Result<T, E = AdminError> = std::result::Result<T, E>;
