//! Terminal output.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use stoneart_core::CurrencyCode;
use stoneart_storefront::api::{Category, Product};
use stoneart_storefront::cart::{CartItem, CartTotals};
use stoneart_storefront::notice::{Notice, NoticeLevel};
use stoneart_storefront::profile::ProfilePage;
use stoneart_storefront::session::Identity;
use stoneart_storefront::state::ProductDetail;

pub fn line(text: &str) {
    println!("{text}");
}

pub fn json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}

pub fn products(products: &[Product], currency: CurrencyCode) {
    if products.is_empty() {
        println!("No products.");
        return;
    }
    for product in products {
        println!(
            "{:>6}  {:<40}  {:>14}  {}",
            product.id.as_i64(),
            product.name,
            product.price.display(currency),
            product.status
        );
    }
}

pub fn product(product: &Product, currency: CurrencyCode) {
    println!("#{} {}", product.id, product.name);
    println!("  price:    {}", product.price.display(currency));
    println!("  category: {}", product.category_id);
    println!("  status:   {}", product.status);
    for url in product.image_urls.as_slice() {
        println!("  image:    {url}");
    }
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
}

pub fn product_detail(detail: &ProductDetail, currency: CurrencyCode) {
    product(&detail.product, currency);
    if detail.in_cart {
        println!();
        println!("(in your cart)");
    }
}

pub fn categories(categories: &[Category]) {
    for category in categories {
        println!("{:>6}  {}", category.id.as_i64(), category.name);
    }
}

pub fn cart(items: &[CartItem], totals: &CartTotals, currency: CurrencyCode) {
    if items.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for item in items {
        println!(
            "{:>6}  {:<40}  {:>3} x {:>12}  {:>14}",
            item.id.as_i64(),
            item.name,
            item.quantity,
            item.price.display(currency),
            currency.format(item.line_total())
        );
    }
    println!();
    self::totals(totals, currency);
}

pub fn totals(totals: &CartTotals, currency: CurrencyCode) {
    println!("Items:    {}", totals.item_count);
    println!("Subtotal: {}", currency.format(totals.subtotal));
    println!("Tax:      {}", currency.format(totals.tax));
    println!("Total:    {}", currency.format(totals.total));
}

pub fn identity(identity: Option<&Identity>) {
    match identity {
        Some(identity) => println!(
            "{} <{}> ({}, id {})",
            identity.name, identity.email, identity.role, identity.id
        ),
        None => println!("Not signed in."),
    }
}

pub fn profile(page: &ProfilePage, currency: CurrencyCode) {
    if let Some(profile) = &page.profile {
        println!("{} <{}>", profile.name, profile.email);
        if let Some(since) = profile.created_at {
            println!("Member since {}", since.format("%Y-%m-%d"));
        }
    }
    if page.orders.is_empty() {
        println!("No orders yet.");
        return;
    }
    for order in &page.orders {
        println!();
        println!(
            "Order #{}  {}  {}  {}",
            order.id,
            order.date.format("%Y-%m-%d"),
            order.status,
            currency.format(order.total)
        );
        for item in &order.items {
            println!(
                "  {:<40} {:>3} x {}",
                item.name,
                item.quantity,
                item.price.display(currency)
            );
        }
    }
}

/// Notices raised during the command, on stderr.
pub fn notices(notices: &[Notice]) {
    for notice in notices {
        let marker = match notice.level {
            NoticeLevel::Info => "*",
            NoticeLevel::Destructive => "!",
        };
        eprintln!("{marker} {notice}");
    }
}
