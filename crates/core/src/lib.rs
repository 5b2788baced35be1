//! 4Fun Core - Shared types library.
//!
//! This crate provides the common domain types used across all 4Fun
//! components:
//! - `storefront` - Cart/wishlist sync engine and backend client
//! - `integration-tests` - End-to-end scenarios against scripted fakes
//!
//! # Architecture
//!
//! The core crate contains only types and pure aggregates - no I/O, no
//! HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Canonical product model and type-safe string IDs
//! - [`cart`] - The cart aggregate (line items, totals, dedup invariant)
//! - [`wishlist`] - The wishlist aggregate (membership by product id)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;
pub mod wishlist;

pub use cart::{Cart, CartLine, CartSnapshot};
pub use types::*;
pub use wishlist::Wishlist;
