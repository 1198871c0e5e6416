//! Admin sign-in, dashboard and catalog writes against the fake backend.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use stoneart_admin::dashboard::{AdminProductPager, Dashboard};
use stoneart_admin::forms::{
    CategoryForm, ImageUpload, PasswordChangeForm, ProductFields, ProductForm, ProductUpdateForm,
    RegisterAdminForm,
};
use stoneart_admin::{AdminClient, AdminError};
use stoneart_core::{CategoryId, Price, ProductId, ProductStatus};
use stoneart_integration_tests::{FakeBackend, admin_token, product_json, storefront};
use stoneart_storefront::api::ApiError;
use stoneart_storefront::catalog::PageOutcome;
use stoneart_storefront::state::Storefront;
use stoneart_storefront::storage::keys;

struct AdminHarness {
    backend: FakeBackend,
    storefront: Storefront,
    client: AdminClient,
    _dir: tempfile::TempDir,
}

async fn admin_session() -> AdminHarness {
    let backend = FakeBackend::start().await;
    backend.empty(Method::GET, "/token", StatusCode::OK);
    backend.ok(Method::GET, "/cart", json!([]));

    let dir = tempfile::tempdir().unwrap();
    let storefront = storefront(&backend, dir.path());
    storefront.storage().set(keys::TOKEN, &admin_token()).unwrap();
    storefront.start().await;
    assert!(storefront.session().state().is_admin());

    let client = AdminClient::from_storefront(&storefront);
    AdminHarness {
        backend,
        storefront,
        client,
        _dir: dir,
    }
}

fn fields(name: &str) -> ProductFields {
    ProductFields {
        name: name.to_string(),
        description: "<p>White marble</p>".to_string(),
        price: Price::parse("15000").unwrap(),
        category_id: CategoryId::new(2),
        status: ProductStatus::Active,
    }
}

fn jpeg(name: &str) -> ImageUpload {
    ImageUpload::new(name, vec![0xff, 0xd8, 0xff, 0xe0]).unwrap()
}

// =============================================================================
// Sign-in
// =============================================================================

#[tokio::test]
async fn test_admin_login_exchanges_credentials() {
    let backend = FakeBackend::start().await;
    backend.ok(
        Method::POST,
        "/auth/admin/login",
        json!({ "token": admin_token() }),
    );
    let dir = tempfile::tempdir().unwrap();
    let storefront = storefront(&backend, dir.path());
    storefront.start().await;

    let identity = storefront
        .session()
        .admin_login("ops@stoneart.example", &SecretString::from("hunter2"))
        .await
        .unwrap();

    assert!(identity.is_admin());
    assert_eq!(storefront.session().location(), "/admin");
    assert_eq!(
        storefront.storage().get(keys::TOKEN).unwrap(),
        Some(admin_token())
    );
    let login = backend.requests_to(&Method::POST, "/auth/admin/login");
    assert_eq!(
        login[0].json(),
        json!({ "email": "ops@stoneart.example", "password": "hunter2" })
    );
}

#[tokio::test]
async fn test_admin_login_rejected() {
    let backend = FakeBackend::start().await;
    backend.on(
        Method::POST,
        "/auth/admin/login",
        StatusCode::UNAUTHORIZED,
        json!({ "error": "invalid credentials" }),
    );
    let dir = tempfile::tempdir().unwrap();
    let storefront = storefront(&backend, dir.path());
    storefront.start().await;

    let result = storefront
        .session()
        .admin_login("ops@stoneart.example", &SecretString::from("wrong"))
        .await;

    assert!(result.is_err());
    assert!(storefront.session().identity().is_none());
    assert_eq!(storefront.storage().get(keys::TOKEN).unwrap(), None);
    assert_eq!(storefront.notices().titles(), vec!["Login Failed".to_string()]);
}

// =============================================================================
// Dashboard
// =============================================================================

#[tokio::test]
async fn test_dashboard_loads_everything_with_token() {
    let h = admin_session().await;
    h.backend
        .ok(Method::GET, "/admin/stats", json!({ "products": 12, "orders": 3 }));
    h.backend.ok(
        Method::GET,
        "/admin/products?limit=10",
        json!([product_json(1, "Ganesha", "15000")]),
    );
    h.backend
        .ok(Method::GET, "/categories", json!([{ "id": 2, "name": "Deities" }]));

    let dashboard = Dashboard::load(&h.client).await.unwrap();

    assert_eq!(dashboard.stats.get("products"), Some(&json!(12)));
    assert_eq!(dashboard.products.len(), 1);
    assert_eq!(dashboard.categories.len(), 1);

    let listing = h.backend.requests_to(&Method::GET, "/admin/products");
    assert_eq!(listing[0].query_value("page"), None);
    assert_eq!(listing[0].bearer(), Some(admin_token().as_str()));
    assert_eq!(
        h.backend.requests_to(&Method::GET, "/admin/stats")[0].bearer(),
        Some(admin_token().as_str())
    );
}

#[tokio::test]
async fn test_dashboard_failure_notifies() {
    let h = admin_session().await;
    h.backend
        .empty(Method::GET, "/admin/stats", StatusCode::INTERNAL_SERVER_ERROR);
    h.backend.ok(Method::GET, "/admin/products", json!([]));
    h.backend.ok(Method::GET, "/categories", json!([]));

    let err = Dashboard::load(&h.client).await.unwrap_err();

    assert!(matches!(err, AdminError::Api(ApiError::Status { status: 500, .. })));
    let notices = h.storefront.notices().drain();
    let failure = notices.iter().find(|n| n.title == "Error").unwrap();
    assert_eq!(
        failure.description.as_deref(),
        Some("Failed to load dashboard data")
    );
}

#[tokio::test]
async fn test_product_pager_stops_at_empty_page() {
    let h = admin_session().await;
    h.backend.ok(
        Method::GET,
        "/admin/products?page=2&limit=10",
        json!([product_json(11, "Lotus", "500"), product_json(12, "Shell", "300")]),
    );
    h.backend
        .ok(Method::GET, "/admin/products?page=3&limit=10", json!([]));

    let first = vec![serde_json::from_value(product_json(1, "Ganesha", "15000")).unwrap()];
    let mut pager = AdminProductPager::new(h.client.clone(), first);

    assert_eq!(pager.load_more().await.unwrap(), PageOutcome::Loaded(2));
    assert_eq!(pager.page(), 2);
    assert_eq!(pager.load_more().await.unwrap(), PageOutcome::Exhausted);
    assert_eq!(pager.page(), 2);
    assert_eq!(pager.products().len(), 3);
    assert!(
        h.storefront
            .notices()
            .titles()
            .contains(&"No more products to load".to_string())
    );
}

#[tokio::test]
async fn test_product_pager_failure_notifies_and_keeps_page() {
    let h = admin_session().await;
    h.backend.empty(
        Method::GET,
        "/admin/products?page=2&limit=10",
        StatusCode::BAD_GATEWAY,
    );

    let first = vec![serde_json::from_value(product_json(1, "Ganesha", "15000")).unwrap()];
    let mut pager = AdminProductPager::new(h.client.clone(), first);

    let err = pager.load_more().await.unwrap_err();

    assert!(matches!(err, AdminError::Api(ApiError::Status { status: 502, .. })));
    assert_eq!(pager.page(), 1);
    assert_eq!(pager.products().len(), 1);
    let notices = h.storefront.notices().drain();
    let failure = notices
        .iter()
        .find(|n| n.title == "Failed to load products")
        .unwrap();
    assert_eq!(failure.description.as_deref(), Some("Please try again later"));
}

#[tokio::test]
async fn test_product_lookup_by_id() {
    let h = admin_session().await;
    h.backend.ok(
        Method::GET,
        "/admin/products?id=5",
        json!([product_json(5, "Buddha", "42000")]),
    );

    let product = h.client.product(ProductId::new(5)).await.unwrap();

    assert_eq!(product.name, "Buddha");
}

// =============================================================================
// Product writes
// =============================================================================

#[tokio::test]
async fn test_create_product_uploads_multipart() {
    let h = admin_session().await;
    h.backend
        .empty(Method::POST, "/admin/product", StatusCode::CREATED);

    h.client
        .create_product(ProductForm {
            fields: fields("Marble Ganesha"),
            images: vec![jpeg("front.jpg"), jpeg("side.jpg")],
        })
        .await
        .unwrap();

    let upload = &h.backend.requests_to(&Method::POST, "/admin/product")[0];
    assert!(
        upload
            .content_type
            .as_deref()
            .unwrap()
            .starts_with("multipart/form-data")
    );
    assert_eq!(upload.bearer(), Some(admin_token().as_str()));
    let body = upload.body_text();
    for expected in [
        "name=\"name\"",
        "Marble Ganesha",
        "name=\"price\"",
        "15000",
        "name=\"category_id\"",
        "name=\"status\"",
        "active",
        "filename=\"front.jpg\"",
        "filename=\"side.jpg\"",
        "image/jpeg",
    ] {
        assert!(body.contains(expected), "missing {expected} in upload");
    }
    assert_eq!(body.matches("name=\"images\"").count(), 2);

    assert_eq!(h.storefront.session().location(), "/admin");
    assert!(
        h.storefront
            .notices()
            .titles()
            .contains(&"Product Added".to_string())
    );
}

#[tokio::test]
async fn test_create_product_without_images_sends_nothing() {
    let h = admin_session().await;

    let err = h
        .client
        .create_product(ProductForm {
            fields: fields("Marble Ganesha"),
            images: Vec::new(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AdminError::Invalid { title: "No images", .. }));
    assert!(h.backend.requests_to(&Method::POST, "/admin/product").is_empty());
    assert!(h.storefront.notices().titles().contains(&"No images".to_string()));
}

#[tokio::test]
async fn test_update_product_keeps_existing_images() {
    let h = admin_session().await;
    h.backend
        .empty(Method::PUT, "/admin/product/5", StatusCode::OK);

    h.client
        .update_product(
            ProductId::new(5),
            ProductUpdateForm {
                fields: fields("Buddha"),
                existing_image_urls: vec!["https://cdn.stoneart.example/5.jpg".to_string()],
                images: vec![jpeg("back.jpg")],
            },
        )
        .await
        .unwrap();

    let update = &h.backend.requests_to(&Method::PUT, "/admin/product/5")[0];
    let body = update.body_text();
    assert!(body.contains("name=\"existing_image_urls\""));
    assert!(body.contains(r#"["https://cdn.stoneart.example/5.jpg"]"#));
    assert!(body.contains("filename=\"back.jpg\""));
    assert!(
        h.storefront
            .notices()
            .titles()
            .contains(&"Product Updated".to_string())
    );
}

#[tokio::test]
async fn test_failed_update_reports_error() {
    let h = admin_session().await;
    h.backend
        .empty(Method::PUT, "/admin/product/5", StatusCode::UNPROCESSABLE_ENTITY);
    let before = h.storefront.session().location();

    let err = h
        .client
        .update_product(
            ProductId::new(5),
            ProductUpdateForm {
                fields: fields("Buddha"),
                existing_image_urls: vec!["https://cdn.stoneart.example/5.jpg".to_string()],
                images: Vec::new(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AdminError::Api(_)));
    assert_eq!(h.storefront.session().location(), before);
    let notices = h.storefront.notices().drain();
    let failure = notices.iter().find(|n| n.title == "Error").unwrap();
    assert_eq!(
        failure.description.as_deref(),
        Some("Failed to update product. Please try again.")
    );
}

// =============================================================================
// Categories & accounts
// =============================================================================

#[tokio::test]
async fn test_create_category_refreshes_cached_list() {
    let h = admin_session().await;
    h.backend
        .ok(Method::GET, "/categories", json!([{ "id": 1, "name": "Deities" }]));
    h.backend
        .empty(Method::POST, "/admin/category", StatusCode::CREATED);

    h.client.api().categories().await.unwrap();
    h.client
        .create_category(CategoryForm {
            name: "Busts".to_string(),
        })
        .await
        .unwrap();
    h.client.api().categories().await.unwrap();

    assert_eq!(
        h.backend.requests_to(&Method::POST, "/admin/category")[0].json(),
        json!({ "name": "Busts" })
    );
    assert_eq!(h.backend.requests_to(&Method::GET, "/categories").len(), 2);
}

#[tokio::test]
async fn test_register_admin_sends_admin_role() {
    let h = admin_session().await;
    h.backend
        .empty(Method::POST, "/admin/register", StatusCode::CREATED);

    h.client
        .register_admin(RegisterAdminForm {
            name: "Meera".to_string(),
            email: "meera@stoneart.example".to_string(),
            password: SecretString::from("s3cret"),
        })
        .await
        .unwrap();

    assert_eq!(
        h.backend.requests_to(&Method::POST, "/admin/register")[0].json(),
        json!({
            "name": "Meera",
            "email": "meera@stoneart.example",
            "password": "s3cret",
            "role": "admin"
        })
    );
    assert!(h.storefront.notices().titles().contains(&"Success".to_string()));
}

#[tokio::test]
async fn test_reset_password_checks_confirmation_first() {
    let h = admin_session().await;
    h.backend.empty(Method::POST, "/admin/reset", StatusCode::OK);

    let mismatch = h
        .client
        .reset_password(PasswordChangeForm {
            current_password: SecretString::from("old"),
            new_password: SecretString::from("new-one"),
            confirm_password: SecretString::from("new-two"),
        })
        .await;
    assert!(matches!(
        mismatch,
        Err(AdminError::Invalid {
            title: "Password Mismatch",
            ..
        })
    ));
    assert!(h.backend.requests_to(&Method::POST, "/admin/reset").is_empty());

    h.client
        .reset_password(PasswordChangeForm {
            current_password: SecretString::from("old"),
            new_password: SecretString::from("new-one"),
            confirm_password: SecretString::from("new-one"),
        })
        .await
        .unwrap();

    assert_eq!(
        h.backend.requests_to(&Method::POST, "/admin/reset")[0].json(),
        json!({ "currentPassword": "old", "newPassword": "new-one" })
    );
}
