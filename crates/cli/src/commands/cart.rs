//! Cart and checkout commands.

use stoneart_core::ProductId;
use stoneart_storefront::cart::CartItem;
use stoneart_storefront::checkout::CheckoutOutcome;
use stoneart_storefront::state::Storefront;

use super::{CliError, app};
use crate::render;

pub fn show(storefront: &Storefront) {
    let cart = storefront.cart();
    render::cart(&cart.items(), &cart.totals(), storefront.config().currency);
}

/// Add one unit of a product, looked up first for its name and price.
pub async fn add(storefront: &Storefront, id: ProductId) -> Result<(), CliError> {
    let product = storefront.api().product(id).await.map_err(app)?;
    let quantity = storefront
        .cart()
        .add_to_cart(&CartItem::from(&product))
        .map_err(app)?;
    render::line(&format!("{} x{quantity}", product.name));
    Ok(())
}

pub fn remove(storefront: &Storefront, id: ProductId) -> Result<(), CliError> {
    let quantity = storefront.cart().remove_from_cart(id).map_err(app)?;
    render::line(&format!("{id} x{quantity}"));
    Ok(())
}

pub fn clear(storefront: &Storefront) -> Result<(), CliError> {
    storefront.cart().clear_cart().map_err(app)?;
    render::line("Cart cleared.");
    Ok(())
}

pub async fn checkout(storefront: &Storefront) -> Result<(), CliError> {
    let checkout = storefront.checkout();
    if !checkout.enter() {
        render::line(&format!(
            "Nothing to check out; now at {}",
            storefront.session().location()
        ));
        return Ok(());
    }

    let totals = checkout.totals();
    render::totals(&totals, storefront.config().currency);

    match checkout.place_order().await.map_err(app)? {
        CheckoutOutcome::RedirectedToLogin(url) => {
            render::line(&format!("Sign in to continue: {url}"));
        }
        CheckoutOutcome::Placed(receipt) => {
            render::line("Order placed.");
            render::json(&receipt);
        }
    }
    Ok(())
}
