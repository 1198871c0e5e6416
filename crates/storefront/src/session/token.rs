//! Unverified bearer-token payload decoding.
//!
//! The payload segment is decoded for display purposes only: the signature
//! is never checked, so the resulting [`Identity`] is a presentation hint and
//! must not gate anything the backend does not re-check.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use stoneart_core::{Email, Role, UserId};
use thiserror::Error;

/// Who the stored token claims to belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

impl Identity {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Errors raised while decoding a token payload.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has no payload segment")]
    Malformed,

    #[error("token payload is not base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token payload is not an identity: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Decode the identity claims carried by `token`.
///
/// Extra claims (`iat`, `exp`, ...) are ignored.
///
/// # Errors
///
/// Returns `TokenError` if the token has no payload segment, the segment is
/// not base64, or it does not hold `id`, `name`, `email` and `role`.
pub fn decode_identity(token: &str) -> Result<Identity, TokenError> {
    let payload = token
        .trim()
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(TokenError::Malformed)?;
    let payload = payload.trim_end_matches('=');

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))?;

    Ok(serde_json::from_slice(&bytes)?)
}
