//! Core types for Stone Art.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod image;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use image::ImageRefs;
pub use price::{CurrencyCode, Price, PriceError};
pub use status::*;
