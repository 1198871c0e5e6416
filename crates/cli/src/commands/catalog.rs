//! Catalog browsing commands.

use stoneart_core::{CategoryId, ProductId};
use stoneart_storefront::catalog::PageOutcome;
use stoneart_storefront::state::Storefront;

use super::{CliError, app};
use crate::render;

/// List products, applying filters the way the catalog page does.
pub async fn products(
    storefront: &Storefront,
    search: Option<&str>,
    categories: &[CategoryId],
    pages: u32,
) -> Result<(), CliError> {
    let mut feed = storefront.product_feed();

    if search.is_none() && categories.is_empty() {
        feed.refresh().await.map_err(app)?;
    }
    if let Some(term) = search {
        feed.search(term).await.map_err(app)?;
    }
    for id in categories {
        feed.toggle_category(*id).await.map_err(app)?;
    }

    for _ in 1..pages {
        if feed.load_more().await.map_err(app)? == PageOutcome::Exhausted {
            break;
        }
    }

    tracing::debug!(page = feed.page(), count = feed.products().len(), "Catalog loaded");
    render::products(feed.products(), storefront.config().currency);
    Ok(())
}

/// Show one product and whether it is in the cart.
pub async fn product(storefront: &Storefront, id: ProductId) -> Result<(), CliError> {
    let detail = storefront.product_detail(id).await?;
    render::product_detail(&detail, storefront.config().currency);
    Ok(())
}

pub async fn categories(storefront: &Storefront) -> Result<(), CliError> {
    let categories = storefront.product_feed().categories().await.map_err(app)?;
    render::categories(&categories);
    Ok(())
}
