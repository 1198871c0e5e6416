//! Stone Art Core - Shared domain types.
//!
//! This crate provides the types used across all Stone Art client components:
//! - `storefront` - Session and cart state holders plus the catalog REST surface
//! - `admin` - Admin REST surface and form validation
//! - `cli` - Command-line view layer
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, roles, statuses and image references

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
