//! Role and status enums.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role carried in a bearer token payload.
///
/// Only a presentation hint on the client: the backend re-checks every
/// privileged call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Storefront customer.
    #[default]
    User,
    /// Store administrator.
    Admin,
}

impl Role {
    /// Whether this role may enter the admin namespace.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Catalog visibility of a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Listed in the storefront.
    #[default]
    Active,
    /// Hidden from the storefront.
    Inactive,
    /// Anything else the backend may send.
    #[serde(untagged)]
    Other(String),
}

impl ProductStatus {
    /// Wire value, as sent in admin form submissions.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("product status cannot be empty".to_string()),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Ok(Self::Other(other.to_string())),
        }
    }
}
