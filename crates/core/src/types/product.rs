//! Canonical product model.
//!
//! A [`Product`] is the fully validated, defaulted representation produced
//! by the storefront's normalization boundary. Every instance that crosses
//! that boundary satisfies the documented constraints, so downstream code
//! never re-validates presence, price, or stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// A resolved platform or genre reference.
///
/// Upstream payloads carry these as a nested object, a bare identifier
/// string, or nothing at all; the normalizer always resolves them to a
/// full `{id, name}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// Stable identifier (e.g., `"xbox"`, or `"unknown"` when absent).
    pub id: String,
    /// Display name (e.g., `"Xbox Series X"`).
    pub name: String,
}

impl EntityRef {
    /// Create a reference from an id and display name.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Whether a product ships as a download or a boxed copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductKind {
    /// Digital download (the default for unrecognized upstream tags).
    #[default]
    Digital,
    /// Physical boxed copy.
    Physical,
}

/// The canonical product representation.
///
/// Serialized in camelCase to match the storefront DTO shape. Constraints
/// guaranteed by the normalizer:
///
/// - `id` is never empty (`"missing-id"` is synthesized when absent)
/// - `name`, `description`, `developer` are never null
/// - `price` and `rating` are >= 0; `stock` is unsigned
/// - `image_url` is absolute or root-relative
/// - `platform` and `genre` are always resolved pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: u32,
    pub image_url: String,
    pub platform: EntityRef,
    pub genre: EntityRef,
    pub kind: ProductKind,
    pub developer: String,
    pub rating: f64,
    pub release_date: DateTime<Utc>,
}

impl Product {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}
