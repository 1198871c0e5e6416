//! Catalog browsing: search, category filters and "load more" paging.
//!
//! A new search term or filter starts over at page 1 and replaces the
//! results; [`ProductFeed::load_more`] appends the next page. An empty page
//! means the listing is exhausted, which is reported separately from a
//! failed fetch.

use std::sync::Arc;

use async_trait::async_trait;
use stoneart_core::CategoryId;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::api::{ApiClient, ApiError, Category, Product, ProductQuery};
use crate::notice::{Notice, Notifier};

/// Read access to the product listing.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError>;

    async fn categories(&self) -> Result<Arc<Vec<Category>>, ApiError>;
}

#[async_trait]
impl CatalogSource for ApiClient {
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        Self::list_products(self, query).await
    }

    async fn categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        Self::categories(self).await
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to fetch products: {0}")]
    Fetch(#[from] ApiError),
}

/// Result of fetching one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// This many products arrived.
    Loaded(usize),
    /// The backend had nothing more.
    Exhausted,
}

/// Accumulated product listing for the catalog page.
pub struct ProductFeed {
    source: Arc<dyn CatalogSource>,
    notifier: Arc<dyn Notifier>,
    page_size: u32,
    search: String,
    categories: Vec<CategoryId>,
    page: u32,
    products: Vec<Product>,
}

impl std::fmt::Debug for ProductFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductFeed")
            .field("search", &self.search)
            .field("categories", &self.categories)
            .field("page", &self.page)
            .field("products", &self.products.len())
            .finish_non_exhaustive()
    }
}

impl ProductFeed {
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>, notifier: Arc<dyn Notifier>, page_size: u32) -> Self {
        Self {
            source,
            notifier,
            page_size,
            search: String::new(),
            categories: Vec::new(),
            page: 1,
            products: Vec::new(),
        }
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Last page fetched successfully.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub fn selected_categories(&self) -> &[CategoryId] {
        &self.categories
    }

    /// All categories, for the filter sidebar.
    ///
    /// # Errors
    ///
    /// Returns an error if the categories cannot be fetched.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, CatalogError> {
        Ok(self.source.categories().await?)
    }

    /// Fetch page 1 for the current filters, replacing the results.
    ///
    /// The page counter goes back to 1 and the old results are dropped
    /// before fetching, so a later [`Self::load_more`] continues the new
    /// listing even if this fetch fails.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Fetch` if the listing cannot be fetched; the
    /// results are left empty.
    #[instrument(skip(self), fields(search = %self.search))]
    pub async fn refresh(&mut self) -> Result<PageOutcome, CatalogError> {
        self.page = 1;
        self.products.clear();
        self.products = self.fetch(1).await?;

        if self.products.is_empty() {
            self.notifier.notify(Notice::info("No more products to load"));
            return Ok(PageOutcome::Exhausted);
        }
        Ok(PageOutcome::Loaded(self.products.len()))
    }

    /// Search by name, starting over at page 1.
    ///
    /// # Errors
    ///
    /// See [`Self::refresh`].
    pub async fn search(&mut self, term: &str) -> Result<PageOutcome, CatalogError> {
        term.trim().clone_into(&mut self.search);
        self.refresh().await
    }

    /// Add or remove a category filter, starting over at page 1.
    ///
    /// # Errors
    ///
    /// See [`Self::refresh`].
    pub async fn toggle_category(&mut self, id: CategoryId) -> Result<PageOutcome, CatalogError> {
        if let Some(index) = self.categories.iter().position(|c| *c == id) {
            self.categories.remove(index);
        } else {
            self.categories.push(id);
        }
        self.refresh().await
    }

    /// Drop every filter, starting over at page 1.
    ///
    /// # Errors
    ///
    /// See [`Self::refresh`].
    pub async fn reset_filters(&mut self) -> Result<PageOutcome, CatalogError> {
        self.search.clear();
        self.categories.clear();
        self.refresh().await
    }

    /// Append the next page.
    ///
    /// An empty page raises a "No more products to load" notice and leaves
    /// the page counter where it was.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Fetch` if the page cannot be fetched.
    #[instrument(skip(self), fields(next = self.page + 1))]
    pub async fn load_more(&mut self) -> Result<PageOutcome, CatalogError> {
        let next = self.page + 1;
        let products = self.fetch(next).await?;

        if products.is_empty() {
            self.notifier.notify(Notice::info("No more products to load"));
            return Ok(PageOutcome::Exhausted);
        }

        let count = products.len();
        self.page = next;
        self.products.extend(products);
        debug!(page = next, count, "Appended page");
        Ok(PageOutcome::Loaded(count))
    }

    fn query(&self, page: u32) -> ProductQuery {
        ProductQuery {
            search: Some(self.search.clone()).filter(|s| !s.is_empty()),
            categories: self.categories.clone(),
            page,
            limit: self.page_size,
        }
    }

    async fn fetch(&self, page: u32) -> Result<Vec<Product>, CatalogError> {
        self.source
            .list_products(&self.query(page))
            .await
            .map_err(|e| {
                warn!(error = %e, page, "Failed to fetch products");
                self.notifier.notify(
                    Notice::destructive("Failed to load products")
                        .with_description("Please try again later"),
                );
                CatalogError::from(e)
            })
    }
}
