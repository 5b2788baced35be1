//! The cart aggregate.
//!
//! [`Cart`] owns the list of line items and the quantity invariants.
//! It is a pure in-memory structure; persistence and remote reconciliation
//! are handled by the storefront sync engine, which mutates the aggregate
//! and captures [`CartSnapshot`]s for rollback.
//!
//! Invariants:
//!
//! - at most one line per `product_id` (adds merge into the existing line)
//! - every stored line has `quantity >= 1` (a zero update is a removal)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{LineId, Product, ProductId};

/// A single cart line.
///
/// Carries the denormalized display fields (`name`, `price`, `image_url`)
/// copied from the canonical product at add time, so an anonymous cart can
/// render without re-fetching the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: LineId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CartLine {
    /// Price times quantity for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A serializable point-in-time copy of the cart contents.
///
/// This is both the rollback snapshot captured before each mutation and
/// the value persisted by the local storage adapter (a plain line array,
/// no further schema).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartSnapshot(pub Vec<CartLine>);

impl CartSnapshot {
    /// Whether the snapshot holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The cart aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Rebuild a cart from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: CartSnapshot) -> Self {
        Self { lines: snapshot.0 }
    }

    /// Replace the cart contents with an authoritative line set.
    pub fn replace(&mut self, lines: Vec<CartLine>) {
        self.lines = lines;
    }

    /// Capture a snapshot of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot(self.lines.clone())
    }

    /// Restore the cart to a previously captured snapshot.
    pub fn restore(&mut self, snapshot: CartSnapshot) {
        self.lines = snapshot.0;
    }

    /// Add a product to the cart, merging into an existing line when the
    /// product is already present. Returns the id of the affected line.
    ///
    /// A `quantity` of zero is floored to one so stored lines always hold
    /// at least one unit.
    pub fn add(&mut self, product: &Product, quantity: u32) -> LineId {
        let quantity = quantity.max(1);

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product.id)
        {
            line.quantity += quantity;
            return line.id.clone();
        }

        let line = CartLine {
            id: LineId::local(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity,
            image_url: Some(product.image_url.clone()),
        };
        let id = line.id.clone();
        self.lines.push(line);
        id
    }

    /// Set the quantity of a line. Zero removes the line; an unknown line
    /// id is a no-op. Returns whether a line was found.
    pub fn set_quantity(&mut self, line_id: &LineId, quantity: u32) -> bool {
        if quantity == 0 {
            let found = self.lines.iter().any(|line| &line.id == line_id);
            self.remove(line_id);
            return found;
        }

        match self.lines.iter_mut().find(|line| &line.id == line_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove a line. Removing an unknown line id is a no-op.
    pub fn remove(&mut self, line_id: &LineId) {
        self.lines.retain(|line| &line.id != line_id);
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// The stored lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Find the line holding a given product, if any.
    #[must_use]
    pub fn find_by_product(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }

    /// Sum of `price * quantity` across all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
