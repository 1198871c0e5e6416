//! Integration tests for Stone Art.
//!
//! The storefront and admin clients run unchanged against [`FakeBackend`],
//! an `axum` router bound to `127.0.0.1:0` inside the test process. Tests
//! script replies per route, drive the clients, then inspect the requests
//! the backend received.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stoneart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_flows` - session, guards, cart sync, checkout
//! - `catalog_paging` - search reset and load more
//! - `admin_flows` - dashboard, product and account writes

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use stoneart_storefront::config::StorefrontConfig;
use stoneart_storefront::state::Storefront;
use url::Url;

// =============================================================================
// Recorded requests
// =============================================================================

/// A request the fake backend received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl Recorded {
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Body parsed as JSON, `null` if it is not JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.authorization.as_deref()?.strip_prefix("Bearer ")
    }
}

// =============================================================================
// FakeBackend
// =============================================================================

struct Route {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    status: StatusCode,
    body: Option<Value>,
}

impl Route {
    fn matches(&self, request: &Recorded) -> bool {
        self.method == request.method
            && self.path == request.path
            && self
                .query
                .iter()
                .all(|(k, v)| request.query_value(k) == Some(v.as_str()))
    }
}

#[derive(Default)]
struct Shared {
    routes: Vec<Route>,
    requests: Vec<Recorded>,
}

type SharedState = Arc<Mutex<Shared>>;

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the Stone Art REST backend.
///
/// Unscripted routes answer `404`. When several scripted routes match, the
/// most recently added wins, so a test can override an earlier reply.
#[derive(Clone)]
pub struct FakeBackend {
    url: Url,
    shared: SharedState,
}

impl FakeBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let shared = SharedState::default();
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&shared));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let url = Url::parse(&format!("http://{addr}")).expect("fake backend URL");
        Self { url, shared }
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Answer requests to `target` (a path, optionally with query pairs that
    /// must all be present) with `status` and a JSON body.
    pub fn on(&self, method: Method, target: &str, status: StatusCode, body: Value) {
        self.route(method, target, status, Some(body));
    }

    /// Answer `200 OK` with a JSON body.
    pub fn ok(&self, method: Method, target: &str, body: Value) {
        self.on(method, target, StatusCode::OK, body);
    }

    /// Answer with `status` and an empty body.
    pub fn empty(&self, method: Method, target: &str, status: StatusCode) {
        self.route(method, target, status, None);
    }

    fn route(&self, method: Method, target: &str, status: StatusCode, body: Option<Value>) {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        lock(&self.shared).routes.push(Route {
            method,
            path: path.to_string(),
            query: parse_query(query),
            status,
            body,
        });
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        lock(&self.shared).requests.clone()
    }

    /// Requests with this method and path.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| &r.method == method && r.path == path)
            .collect()
    }

    /// `METHOD /path` of every request, for asserting call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

async fn handle(
    State(shared): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };
    let recorded = Recorded {
        method,
        path: uri.path().to_string(),
        query: parse_query(uri.query().unwrap_or_default()),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body,
    };

    let mut shared = lock(&shared);
    let reply = shared
        .routes
        .iter()
        .rev()
        .find(|route| route.matches(&recorded))
        .map(|route| (route.status, route.body.clone()));
    shared.requests.push(recorded);
    drop(shared);

    match reply {
        Some((status, Some(body))) => (status, axum::Json(body)).into_response(),
        Some((status, None)) => status.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

// =============================================================================
// Fixtures
// =============================================================================

/// An unsigned bearer token whose payload names this user.
#[must_use]
pub fn token_for(id: i64, name: &str, email: &str, role: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = json!({ "id": id, "name": name, "email": email, "role": role });
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{payload}.signature")
}

/// Token for a storefront customer.
#[must_use]
pub fn customer_token() -> String {
    token_for(7, "Asha", "asha@example.com", "user")
}

/// Token for an administrator.
#[must_use]
pub fn admin_token() -> String {
    token_for(1, "Ops", "ops@stoneart.example", "admin")
}

/// Product JSON as the catalog endpoints send it.
#[must_use]
pub fn product_json(id: i64, name: &str, price: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "<p>Hand carved</p>",
        "price": price,
        "status": "active",
        "category_id": 1,
        "image_urls": [format!("https://cdn.stoneart.example/{id}.jpg")]
    })
}

/// A storefront talking to `backend`, with file storage under `state_dir`.
///
/// # Panics
///
/// Panics if the configuration or storage cannot be set up.
#[must_use]
pub fn storefront(backend: &FakeBackend, state_dir: &Path) -> Storefront {
    let api_url = backend.url().to_string();
    let state_dir = state_dir.display().to_string();
    let config = StorefrontConfig::from_lookup(|key| match key {
        "STONEART_API_URL" => Some(api_url.clone()),
        "STONEART_STATE_DIR" => Some(state_dir.clone()),
        _ => None,
    })
    .expect("test configuration");
    Storefront::new(config).expect("file storage")
}
