//! Catalog endpoints: products, search and categories.

use std::sync::Arc;

use stoneart_core::ProductId;
use tracing::{debug, instrument};

use super::{ApiClient, ApiError, CacheKey, Category, Product, ProductQuery};

impl ApiClient {
    /// Fetch one page of the catalog listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(page = query.page, filtered = query.is_filtered()))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let (path, pairs) = query.to_request();
        let url = self.endpoint_with_query(path, &pairs)?;
        let products: Vec<Product> = self.get_json(url, None).await?;
        debug!(count = products.len(), "Fetched product page");
        Ok(products)
    }

    /// Fetch the first `limit` products for the landing page.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn featured_products(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        let url = self.endpoint_with_query("/products", &[("limit", limit.to_string())])?;
        self.get_json(url, None).await
    }

    /// Fetch a single product by id.
    ///
    /// The search endpoint answers with a list; the matching entry is picked
    /// out of it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no listed product carries `id`.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let url = self.endpoint_with_query("/products/search", &[("id", id.to_string())])?;
        let value: serde_json::Value = self.get_json(url, None).await?;
        pick_product(value, id)
    }

    /// List all categories (cached for five minutes).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        if let Some(categories) = self.inner.cache.get(&CacheKey::Categories).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint("/categories")?;
        let categories: Arc<Vec<Category>> = Arc::new(self.get_json(url, None).await?);

        self.inner
            .cache
            .insert(CacheKey::Categories, Arc::clone(&categories))
            .await;

        Ok(categories)
    }

    /// Drop cached reference data, e.g. after an admin creates a category.
    pub async fn invalidate_categories(&self) {
        self.inner.cache.invalidate(&CacheKey::Categories).await;
    }
}

/// Pick `id` out of a product lookup answer that is either a list or a
/// single object.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if `id` is absent and `ApiError::Parse` if
/// the answer is not product JSON.
pub fn pick_product(value: serde_json::Value, id: ProductId) -> Result<Product, ApiError> {
    match value {
        serde_json::Value::Array(items) => {
            let products: Vec<Product> = serde_json::from_value(serde_json::Value::Array(items))?;
            products
                .into_iter()
                .find(|p| p.id == id)
                .ok_or_else(|| ApiError::NotFound(format!("Product not found: {id}")))
        }
        serde_json::Value::Null => Err(ApiError::NotFound(format!("Product not found: {id}"))),
        other => Ok(serde_json::from_value(other)?),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product_json(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("Piece {id}"),
            "description": "",
            "price": "100",
            "status": "active",
            "category_id": 1,
            "image_urls": []
        })
    }

    #[test]
    fn test_pick_product_from_list() {
        let value = json!([product_json(1), product_json(2)]);
        let product = pick_product(value, ProductId::new(2)).unwrap();
        assert_eq!(product.name, "Piece 2");
    }

    #[test]
    fn test_pick_product_missing() {
        let value = json!([product_json(1)]);
        let err = pick_product(value, ProductId::new(9)).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(matches!(
            pick_product(serde_json::Value::Null, ProductId::new(9)),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_pick_product_single_object() {
        let product = pick_product(product_json(4), ProductId::new(4)).unwrap();
        assert_eq!(product.id, ProductId::new(4));
    }
}
