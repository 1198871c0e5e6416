//! Cart line items, snapshots and totals.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stoneart_core::{ImageRefs, Price, ProductId};
use tracing::warn;

use crate::api::{Product, RemoteCartLine};
use crate::storage::{ClientStorage, keys};

/// Sales tax applied on top of the subtotal (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// One product in the cart.
///
/// This is also the shape persisted under the `cart` storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image_urls: ImageRefs,
    pub quantity: u32,
}

impl CartItem {
    /// Line total (price x quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.times(self.quantity)
    }
}

impl From<&Product> for CartItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image_urls: product.image_urls.clone(),
            quantity: 1,
        }
    }
}

impl From<RemoteCartLine> for CartItem {
    fn from(line: RemoteCartLine) -> Self {
        Self {
            id: line.product_id,
            name: line.name,
            price: line.price,
            image_urls: line.image_urls,
            quantity: line.quantity,
        }
    }
}

/// Lifecycle of the cart holder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CartPhase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

/// Observable cart state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub phase: CartPhase,
}

impl CartSnapshot {
    /// Product ids currently in the cart.
    #[must_use]
    pub fn membership(&self) -> BTreeSet<ProductId> {
        self.items.iter().map(|item| item.id).collect()
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    #[must_use]
    pub fn quantity_of(&self, id: ProductId) -> u32 {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map_or(0, |item| item.quantity)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals::of(&self.items)
    }
}

/// Derived money figures for the cart page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    /// Number of distinct lines.
    pub item_count: usize,
}

impl CartTotals {
    #[must_use]
    pub fn of(items: &[CartItem]) -> Self {
        let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();
        let tax = (subtotal * TAX_RATE).round_dp(2);
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
            item_count: items.len(),
        }
    }
}

/// Cart items persisted by the last session, empty if none or unreadable.
#[must_use]
pub fn stored_items(storage: &dyn ClientStorage) -> Vec<CartItem> {
    read_json(storage, keys::CART).unwrap_or_default()
}

/// Membership set persisted by the last cart change.
///
/// Lets product pages answer "already in cart?" without the cart holder.
#[must_use]
pub fn stored_membership(storage: &dyn ClientStorage) -> BTreeSet<ProductId> {
    read_json(storage, keys::CART_SET).unwrap_or_default()
}

fn read_json<T: serde::de::DeserializeOwned>(storage: &dyn ClientStorage, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(error = %e, key, "Failed to read cart storage");
            return None;
        }
    };
    serde_json::from_str(&raw)
        .inspect_err(|e| warn!(error = %e, key, "Discarding unreadable cart storage"))
        .ok()
}
