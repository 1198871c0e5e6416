//! Stone Art admin library.
//!
//! Catalog management on top of the storefront session: dashboard data,
//! product and category writes, admin accounts.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod dashboard;
pub mod error;
pub mod forms;

pub use client::AdminClient;
pub use error::AdminError;
