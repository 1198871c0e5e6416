//! Wire types exchanged with the backend.
//!
//! These mirror the JSON the backend produces and consumes. Domain-side
//! types (cart lines, identities) live with the holders that own them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use stoneart_core::{CategoryId, Email, ImageRefs, OrderId, Price, ProductId, ProductStatus};

// =============================================================================
// Catalog
// =============================================================================

/// A product as listed by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Rich-text HTML authored in the admin editor.
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub status: ProductStatus,
    pub category_id: CategoryId,
    #[serde(default)]
    pub image_urls: ImageRefs,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Catalog listing parameters.
///
/// Without a search term or category filter the plain listing endpoint is
/// used; with either, the search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Name search term (already trimmed; empty means no search).
    pub search: Option<String>,
    /// Category filter (any of).
    pub categories: Vec<CategoryId>,
    /// 1-based page number.
    pub page: u32,
    /// Page size for the plain listing.
    pub limit: u32,
}

impl ProductQuery {
    /// Whether a search term or category filter is active.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.is_empty()) || !self.categories.is_empty()
    }

    /// Endpoint path and query pairs for this listing.
    #[must_use]
    pub fn to_request(&self) -> (&'static str, Vec<(&'static str, String)>) {
        if self.is_filtered() {
            let mut query = Vec::with_capacity(3);
            if let Some(term) = self.search.as_deref().filter(|s| !s.is_empty()) {
                query.push(("name", term.to_string()));
            }
            if !self.categories.is_empty() {
                let joined = self
                    .categories
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                query.push(("category", joined));
            }
            query.push(("page", self.page.to_string()));
            ("/products/search", query)
        } else {
            (
                "/products",
                vec![
                    ("page", self.page.to_string()),
                    ("limit", self.limit.to_string()),
                ],
            )
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A line of the remote per-user cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image_urls: ImageRefs,
    pub quantity: u32,
}

/// Body of `POST /cart`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartUpsert {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Quantity adjustment direction for `PUT /cart/quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityAction {
    Decrease,
}

/// Body of `PUT /cart/quantity`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartQuantityChange {
    pub product_id: ProductId,
    pub action: QuantityAction,
}

// =============================================================================
// Auth
// =============================================================================

/// Body of `POST /auth/admin/login`.
#[derive(Serialize)]
pub(crate) struct AdminLoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Answer of `POST /auth/admin/login`.
#[derive(Deserialize)]
pub(crate) struct AdminLoginResponse {
    pub token: String,
}

impl From<AdminLoginResponse> for SecretString {
    fn from(response: AdminLoginResponse) -> Self {
        Self::from(response.token)
    }
}

// =============================================================================
// Orders & profile
// =============================================================================

/// The signed-in customer's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A past order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(alias = "created_at")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub status: String,
}

/// A line of a past order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

/// Whatever `POST /orders/checkout` answers with; kept opaque.
pub type CheckoutReceipt = serde_json::Value;
