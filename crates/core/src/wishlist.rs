//! The wishlist aggregate.
//!
//! Membership-only: a [`Wishlist`] is a set of canonical products
//! deduplicated by product id. `toggle` is the sole mutator, so invoking
//! it twice always round-trips to the original membership - there is no
//! separate add/remove to race against.

use serde::{Deserialize, Serialize};

use crate::types::{Product, ProductId};

/// The wishlist aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    entries: Vec<Product>,
}

impl Wishlist {
    /// Create an empty wishlist.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Replace the contents with an authoritative product set,
    /// deduplicating by product id (first occurrence wins).
    pub fn replace(&mut self, products: Vec<Product>) {
        self.entries.clear();
        for product in products {
            if !self.contains(&product.id) {
                self.entries.push(product);
            }
        }
    }

    /// Toggle a product's membership. Returns `true` when the product is
    /// present after the call.
    pub fn toggle(&mut self, product: &Product) -> bool {
        if self.contains(&product.id) {
            self.entries.retain(|entry| entry.id != product.id);
            false
        } else {
            self.entries.push(product.clone());
            true
        }
    }

    /// Whether a product is wishlisted.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.entries.iter().any(|entry| &entry.id == product_id)
    }

    /// The wishlisted products, in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[Product] {
        &self.entries
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of wishlisted products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the wishlist is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
