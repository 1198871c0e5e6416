//! In-memory backends shared by the unit tests.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use stoneart_core::ProductId;
use url::Url;

use crate::api::{ApiError, RemoteCartLine};
use crate::cart::CartBackend;
use crate::session::SessionBackend;

/// An unsigned token carrying `payload`.
pub fn token_for(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.sig")
}

fn rejected() -> ApiError {
    ApiError::Status {
        status: 401,
        body: "unauthorized".to_string(),
    }
}

pub struct FakeSessionBackend {
    accept: bool,
    admin: Option<(String, String, String)>,
}

impl FakeSessionBackend {
    pub const fn accepting() -> Self {
        Self {
            accept: true,
            admin: None,
        }
    }

    pub const fn rejecting() -> Self {
        Self {
            accept: false,
            admin: None,
        }
    }

    pub fn with_admin(mut self, email: &str, password: &str, token: &str) -> Self {
        self.admin = Some((email.to_string(), password.to_string(), token.to_string()));
        self
    }
}

#[async_trait]
impl SessionBackend for FakeSessionBackend {
    async fn verify_token(&self, _token: &SecretString) -> Result<(), ApiError> {
        if self.accept { Ok(()) } else { Err(rejected()) }
    }

    async fn admin_login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SecretString, ApiError> {
        match &self.admin {
            Some((e, p, token)) if e == email && p == password.expose_secret() => {
                Ok(SecretString::from(token.clone()))
            }
            _ => Err(rejected()),
        }
    }

    fn oauth_entry_url(&self) -> Result<Url, ApiError> {
        Ok(Url::parse("http://api.test/auth/google")?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Fetch,
    Upsert(ProductId, u32),
    Decrease(ProductId),
    Clear,
}

#[derive(Default)]
pub struct FakeCartBackend {
    lines: Vec<RemoteCartLine>,
    fail_fetch: bool,
    fail_writes: bool,
    calls: Mutex<Vec<RemoteCall>>,
}

impl FakeCartBackend {
    pub fn with_lines(lines: serde_json::Value) -> Self {
        Self {
            lines: serde_json::from_value(lines).unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            fail_fetch: true,
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: RemoteCall, fail: bool) -> Result<(), ApiError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        if fail { Err(rejected()) } else { Ok(()) }
    }
}

#[async_trait]
impl CartBackend for FakeCartBackend {
    async fn fetch_cart(&self, _token: &SecretString) -> Result<Vec<RemoteCartLine>, ApiError> {
        self.record(RemoteCall::Fetch, self.fail_fetch)?;
        Ok(self.lines.clone())
    }

    async fn upsert_line(
        &self,
        _token: &SecretString,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.record(RemoteCall::Upsert(product_id, quantity), self.fail_writes)
    }

    async fn decrease_line(
        &self,
        _token: &SecretString,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        self.record(RemoteCall::Decrease(product_id), self.fail_writes)
    }

    async fn clear(&self, _token: &SecretString) -> Result<(), ApiError> {
        self.record(RemoteCall::Clear, self.fail_writes)
    }
}
