//! Admin dashboard data and product paging.

use std::sync::Arc;

use stoneart_storefront::api::{ApiError, Category, Product};
use stoneart_storefront::catalog::PageOutcome;
use stoneart_storefront::notice::Notice;
use tracing::{debug, instrument, warn};

use crate::client::{AdminClient, DashboardStats};
use crate::error::Result;

/// Products per admin listing page.
pub const ADMIN_PAGE_SIZE: u32 = 10;

/// Everything the dashboard shows on first load.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub products: Vec<Product>,
    pub categories: Arc<Vec<Category>>,
}

impl Dashboard {
    /// Load stats, the first product page and the categories concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first failure after raising "Failed to load dashboard data".
    #[instrument(skip(client))]
    pub async fn load(client: &AdminClient) -> Result<Self> {
        let (stats, products, categories) = tokio::join!(
            client.stats(),
            client.products(None, ADMIN_PAGE_SIZE),
            client.api().categories(),
        );

        let loaded = Self::assemble(stats, products, categories);

        if let Err(err) = &loaded {
            warn!(error = %err, "Failed to load dashboard");
            client.notifier().notify(
                Notice::destructive("Error").with_description("Failed to load dashboard data"),
            );
        }
        loaded
    }

    fn assemble(
        stats: Result<DashboardStats>,
        products: Result<Vec<Product>>,
        categories: Result<Arc<Vec<Category>>, ApiError>,
    ) -> Result<Self> {
        Ok(Self {
            stats: stats?,
            products: products?,
            categories: categories?,
        })
    }
}

/// Accumulated admin product listing.
#[derive(Debug)]
pub struct AdminProductPager {
    client: AdminClient,
    page: u32,
    products: Vec<Product>,
}

impl AdminProductPager {
    /// Pager continuing after an already shown first page.
    #[must_use]
    pub const fn new(client: AdminClient, first_page: Vec<Product>) -> Self {
        Self {
            client,
            page: 1,
            products: first_page,
        }
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Fetch the next page and append it.
    ///
    /// The page counter only advances when products arrive.
    ///
    /// # Errors
    ///
    /// Returns an error, after a "Failed to load products" notice, if the
    /// request fails; loaded products are kept.
    #[instrument(skip(self), fields(page = self.page + 1))]
    pub async fn load_more(&mut self) -> Result<PageOutcome> {
        let next = self.page + 1;
        let batch = match self.client.products(Some(next), ADMIN_PAGE_SIZE).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, page = next, "Failed to load admin products");
                self.client.notifier().notify(
                    Notice::destructive("Failed to load products")
                        .with_description("Please try again later"),
                );
                return Err(e);
            }
        };

        if batch.is_empty() {
            self.client
                .notifier()
                .notify(Notice::info("No more products to load"));
            return Ok(PageOutcome::Exhausted);
        }

        let count = batch.len();
        self.products.extend(batch);
        self.page = next;
        debug!(count, total = self.products.len(), "Appended admin products");
        Ok(PageOutcome::Loaded(count))
    }
}
