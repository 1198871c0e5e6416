//! Authenticated admin REST surface.
//!
//! Every call carries the stored bearer token. Writes validate their form
//! first, surface the outcome as a notice, and return to the dashboard on
//! success.

use std::sync::Arc;

use reqwest::Method;
use secrecy::SecretString;
use stoneart_core::ProductId;
use stoneart_storefront::api::catalog::pick_product;
use stoneart_storefront::api::{ApiClient, Product};
use stoneart_storefront::navigation::Navigation;
use stoneart_storefront::notice::{Notice, Notifier};
use stoneart_storefront::session::SessionStore;
use stoneart_storefront::state::Storefront;
use tracing::{info, instrument, warn};

use crate::error::{AdminError, Result};
use crate::forms::{CategoryForm, PasswordChangeForm, ProductForm, ProductUpdateForm, RegisterAdminForm};

/// Dashboard landing path.
pub const DASHBOARD_PATH: &str = "/admin";

/// Free-form dashboard counters.
pub type DashboardStats = serde_json::Map<String, serde_json::Value>;

/// Notices raised for one kind of write.
struct WriteNotices {
    success_title: &'static str,
    success: &'static str,
    failure: &'static str,
}

/// Client for the `/admin` endpoints.
#[derive(Clone)]
pub struct AdminClient {
    api: ApiClient,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    #[must_use]
    pub fn new(api: ApiClient, session: SessionStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            session,
            notifier,
        }
    }

    /// Admin client sharing the storefront's API client, session and notices.
    #[must_use]
    pub fn from_storefront(storefront: &Storefront) -> Self {
        Self::new(
            storefront.api().clone(),
            storefront.session().clone(),
            storefront.notifier(),
        )
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    fn token(&self) -> Result<SecretString> {
        self.session.get_token().ok_or(AdminError::Unauthenticated)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Dashboard counters.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is stored or the request fails.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<DashboardStats> {
        let token = self.token()?;
        let url = self.api.endpoint("/admin/stats")?;
        Ok(self.api.get_json(url, Some(&token)).await?)
    }

    /// One page of the admin product listing. `page` is omitted for the
    /// dashboard's first view.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is stored or the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, page: Option<u32>, limit: u32) -> Result<Vec<Product>> {
        let token = self.token()?;
        let mut query = Vec::with_capacity(2);
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        query.push(("limit", limit.to_string()));
        let url = self.api.endpoint_with_query("/admin/products", &query)?;
        Ok(self.api.get_json(url, Some(&token)).await?)
    }

    /// A single product, for the edit form.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is stored, the request fails or the
    /// product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product> {
        let token = self.token()?;
        let url = self
            .api
            .endpoint_with_query("/admin/products", &[("id", id.to_string())])?;
        let value: serde_json::Value = self.api.get_json(url, Some(&token)).await?;
        Ok(pick_product(value, id)?)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create a product with 1..=4 images.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` if the form fails validation, otherwise
    /// an error if the upload fails.
    #[instrument(skip(self, form), fields(name = %form.fields.name, images = form.images.len()))]
    pub async fn create_product(&self, form: ProductForm) -> Result<()> {
        const NOTICES: WriteNotices = WriteNotices {
            success_title: "Product Added",
            success: "Your product has been added successfully",
            failure: "Failed to add product. Please try again.",
        };

        let body = self.checked(form.into_multipart())?;
        let result: Result<()> = async {
            let token = self.token()?;
            let url = self.api.endpoint("/admin/product")?;
            self.api
                .send_multipart(Method::POST, url, body, Some(&token))
                .await?;
            Ok(())
        }
        .await;
        self.finish_write(result, &NOTICES)
    }

    /// Replace a product's fields and images.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` if the form fails validation, otherwise
    /// an error if the upload fails.
    #[instrument(skip(self, form), fields(product_id = %id))]
    pub async fn update_product(&self, id: ProductId, form: ProductUpdateForm) -> Result<()> {
        const NOTICES: WriteNotices = WriteNotices {
            success_title: "Product Updated",
            success: "Your product has been updated successfully",
            failure: "Failed to update product. Please try again.",
        };

        let body = self.checked(form.into_multipart())?;
        let result: Result<()> = async {
            let token = self.token()?;
            let url = self.api.endpoint(&format!("/admin/product/{id}"))?;
            self.api
                .send_multipart(Method::PUT, url, body, Some(&token))
                .await?;
            Ok(())
        }
        .await;
        self.finish_write(result, &NOTICES)
    }

    /// Create a category and drop the cached category list.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` for a blank name, otherwise an error if
    /// the request fails.
    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create_category(&self, form: CategoryForm) -> Result<()> {
        const NOTICES: WriteNotices = WriteNotices {
            success_title: "Category Added",
            success: "Your category has been added successfully",
            failure: "Failed to add category. Please try again.",
        };

        self.checked(form.validate())?;
        let result: Result<()> = async {
            let token = self.token()?;
            let url = self.api.endpoint("/admin/category")?;
            self.api
                .send_json_unit(Method::POST, url, &form, Some(&token))
                .await?;
            self.api.invalidate_categories().await;
            Ok(())
        }
        .await;
        self.finish_write(result, &NOTICES)
    }

    /// Register another administrator.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` if a field is missing, otherwise an
    /// error if the request fails.
    #[instrument(skip(self, form))]
    pub async fn register_admin(&self, form: RegisterAdminForm) -> Result<()> {
        const NOTICES: WriteNotices = WriteNotices {
            success_title: "Success",
            success: "New admin user has been added",
            failure: "Failed to add admin user. Please try again.",
        };

        let email = self.checked(form.validate())?;
        let result: Result<()> = async {
            let token = self.token()?;
            let url = self.api.endpoint("/admin/register")?;
            self.api
                .send_json_unit(Method::POST, url, &form.body(&email), Some(&token))
                .await?;
            Ok(())
        }
        .await;
        self.finish_write(result, &NOTICES)
    }

    /// Change the signed-in admin's password.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` if the form is incomplete or the
    /// confirmation does not match, otherwise an error if the request fails.
    #[instrument(skip(self, form))]
    pub async fn reset_password(&self, form: PasswordChangeForm) -> Result<()> {
        const NOTICES: WriteNotices = WriteNotices {
            success_title: "Success",
            success: "Your password has been updated",
            failure: "Failed to change password. Please check your current password and try again.",
        };

        self.checked(form.validate())?;
        let result: Result<()> = async {
            let token = self.token()?;
            let url = self.api.endpoint("/admin/reset")?;
            self.api
                .send_json_unit(Method::POST, url, &form.body(), Some(&token))
                .await?;
            Ok(())
        }
        .await;
        self.finish_write(result, &NOTICES)
    }

    /// Surface a validation failure before anything is sent.
    fn checked<T>(&self, result: Result<T>) -> Result<T> {
        result.inspect_err(|err| {
            if let Some(notice) = err.notice() {
                self.notifier.notify(notice);
            }
        })
    }

    fn finish_write(&self, result: Result<()>, notices: &WriteNotices) -> Result<()> {
        match result {
            Ok(()) => {
                info!("Admin write succeeded");
                self.notifier.notify(
                    Notice::info(notices.success_title).with_description(notices.success),
                );
                self.session.go(Navigation::Push(DASHBOARD_PATH.to_string()));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Admin write failed");
                self.notifier
                    .notify(Notice::destructive("Error").with_description(notices.failure));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use secrecy::SecretString;
    use stoneart_storefront::config::StorefrontConfig;
    use stoneart_storefront::storage::MemoryStorage;

    use super::*;

    fn storefront() -> Storefront {
        let config = StorefrontConfig::from_lookup(|key| match key {
            // Nothing listens here; validation must stop before any request.
            "STONEART_API_URL" => Some("http://127.0.0.1:9".to_string()),
            "STONEART_STATE_DIR" => Some("/nonexistent".to_string()),
            _ => None,
        })
        .unwrap();
        Storefront::with_storage(config, Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_password_mismatch_notifies_without_request() {
        let storefront = storefront();
        let admin = AdminClient::from_storefront(&storefront);

        let err = admin
            .reset_password(PasswordChangeForm {
                current_password: SecretString::from("old"),
                new_password: SecretString::from("a"),
                confirm_password: SecretString::from("b"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::Invalid { .. }));
        assert_eq!(storefront.notices().titles(), vec!["Password Mismatch".to_string()]);
        assert!(storefront.history().last().is_none());
    }

    #[tokio::test]
    async fn test_write_without_token_reports_failure() {
        let storefront = storefront();
        let admin = AdminClient::from_storefront(&storefront);

        let err = admin
            .create_category(CategoryForm {
                name: "Busts".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::Unauthenticated));
        let notices = storefront.notices().drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Error");
        assert_eq!(
            notices[0].description.as_deref(),
            Some("Failed to add category. Please try again.")
        );
    }

    #[tokio::test]
    async fn test_reads_require_token() {
        let admin = AdminClient::from_storefront(&storefront());
        assert!(matches!(admin.stats().await, Err(AdminError::Unauthenticated)));
        assert!(matches!(
            admin.products(Some(2), 10).await,
            Err(AdminError::Unauthenticated)
        ));
    }
}
