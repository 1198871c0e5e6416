//! Stone Art storefront client library.
//!
//! Session and cart state holders backed by durable client storage, the
//! REST client for the Stone Art backend, and the view-level flows built on
//! them (catalog paging, checkout, profile).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod navigation;
pub mod notice;
pub mod profile;
pub mod session;
pub mod state;
pub mod storage;

#[cfg(test)]
mod testing;
