//! Catalog listing, search reset and load-more against the fake backend.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use stoneart_core::{CategoryId, ProductId};
use stoneart_integration_tests::{FakeBackend, product_json, storefront};
use stoneart_storefront::api::Product;
use stoneart_storefront::catalog::{CatalogError, PageOutcome};

fn ids(products: &[Product]) -> Vec<i64> {
    products.iter().map(|p| p.id.as_i64()).collect()
}

async fn catalog_backend() -> FakeBackend {
    let backend = FakeBackend::start().await;
    backend.ok(
        Method::GET,
        "/products?page=1&limit=10",
        json!([product_json(1, "Ganesha", "15000"), product_json(2, "Nandi", "8000")]),
    );
    backend.ok(
        Method::GET,
        "/products/search?name=marble&page=1",
        json!([product_json(3, "Marble Bust", "22000")]),
    );
    backend.ok(
        Method::GET,
        "/products/search?name=marble&page=2",
        json!([product_json(4, "Marble Lotus", "6000")]),
    );
    backend.ok(Method::GET, "/products/search?name=marble&page=3", json!([]));
    backend
}

#[tokio::test]
async fn test_search_resets_paging_and_load_more_appends() {
    let backend = catalog_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let storefront = storefront(&backend, dir.path());
    let mut feed = storefront.product_feed();

    assert_eq!(feed.refresh().await.unwrap(), PageOutcome::Loaded(2));
    assert_eq!(ids(feed.products()), vec![1, 2]);

    assert_eq!(feed.search("  marble ").await.unwrap(), PageOutcome::Loaded(1));
    assert_eq!(feed.search_term(), "marble");
    assert_eq!(feed.page(), 1);
    assert_eq!(ids(feed.products()), vec![3]);

    assert_eq!(feed.load_more().await.unwrap(), PageOutcome::Loaded(1));
    assert_eq!(feed.page(), 2);
    assert_eq!(ids(feed.products()), vec![3, 4]);

    assert_eq!(feed.load_more().await.unwrap(), PageOutcome::Exhausted);
    assert_eq!(feed.page(), 2);
    assert_eq!(ids(feed.products()), vec![3, 4]);
    assert_eq!(
        storefront.notices().titles(),
        vec!["No more products to load".to_string()]
    );

    let searches = backend.requests_to(&Method::GET, "/products/search");
    let pages: Vec<_> = searches
        .iter()
        .map(|r| r.query_value("page").unwrap().to_string())
        .collect();
    assert_eq!(pages, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_failed_filter_starts_over_and_reset_restores_listing() {
    let backend = catalog_backend().await;
    backend.empty(
        Method::GET,
        "/products/search?category=2&page=1",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    backend.ok(
        Method::GET,
        "/products/search?category=2&page=2",
        json!([product_json(6, "Marble Nandi", "9000")]),
    );
    let dir = tempfile::tempdir().unwrap();
    let storefront = storefront(&backend, dir.path());
    let mut feed = storefront.product_feed();

    feed.search("marble").await.unwrap();
    feed.load_more().await.unwrap();
    assert_eq!(feed.page(), 2);
    assert_eq!(ids(feed.products()), vec![3, 4]);

    let err = feed.toggle_category(CategoryId::new(2)).await.unwrap_err();
    assert!(matches!(err, CatalogError::Fetch(_)));
    assert_eq!(feed.page(), 1);
    assert!(feed.products().is_empty());
    assert_eq!(
        storefront.notices().titles(),
        vec!["Failed to load products".to_string()]
    );

    assert_eq!(feed.load_more().await.unwrap(), PageOutcome::Loaded(1));
    assert_eq!(feed.page(), 2);
    assert_eq!(ids(feed.products()), vec![6]);

    let filtered: Vec<_> = backend
        .requests_to(&Method::GET, "/products/search")
        .into_iter()
        .filter(|r| r.query_value("category") == Some("2"))
        .map(|r| r.query_value("page").unwrap().to_string())
        .collect();
    assert_eq!(filtered, vec!["1", "2"]);

    assert_eq!(feed.reset_filters().await.unwrap(), PageOutcome::Loaded(2));
    assert!(feed.selected_categories().is_empty());
    assert_eq!(feed.search_term(), "");
    assert_eq!(feed.page(), 1);
    assert_eq!(ids(feed.products()), vec![1, 2]);
}

#[tokio::test]
async fn test_categories_are_cached() {
    let backend = FakeBackend::start().await;
    backend.ok(
        Method::GET,
        "/categories",
        json!([{ "id": 1, "name": "Deities" }, { "id": 2, "name": "Busts" }]),
    );
    let dir = tempfile::tempdir().unwrap();
    let storefront = storefront(&backend, dir.path());
    let feed = storefront.product_feed();

    let first = feed.categories().await.unwrap();
    let second = feed.categories().await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(backend.requests_to(&Method::GET, "/categories").len(), 1);
}

#[tokio::test]
async fn test_product_detail_reports_cart_membership() {
    let backend = FakeBackend::start().await;
    backend.ok(
        Method::GET,
        "/products/search?id=9",
        json!([product_json(8, "Other", "10"), product_json(9, "Nataraja", "30000")]),
    );
    let dir = tempfile::tempdir().unwrap();
    let storefront = storefront(&backend, dir.path());
    storefront
        .storage()
        .set(stoneart_storefront::storage::keys::CART_SET, "[9]")
        .unwrap();

    let detail = storefront.product_detail(ProductId::new(9)).await.unwrap();

    assert_eq!(detail.product.name, "Nataraja");
    assert!(detail.in_cart);
}
