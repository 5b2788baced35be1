//! 4Fun backend API client.
//!
//! # Architecture
//!
//! - Plain REST over `reqwest`; the backend is the source of truth for
//!   authenticated carts and wishlists - no local sync, direct API calls
//! - Every raw payload is repaired by the [`normalize`] boundary before
//!   it leaves this module; nothing downstream sees an unvalidated record
//! - Catalog reads are cached in-memory via `moka` (5 minute TTL by
//!   default); cart/wishlist reads are never cached
//!
//! The [`RemoteStore`] trait is the seam the sync orchestrator depends
//! on: [`BackendClient`] implements it in production, scripted fakes
//! implement it in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use four_fun_storefront::backend::BackendClient;
//! use four_fun_storefront::config::StoreConfig;
//!
//! let client = BackendClient::new(&StoreConfig::from_env()?);
//!
//! // Catalog (no auth required, cached)
//! let page = client.list_products(&Default::default()).await?;
//!
//! // Cart (authenticated, never cached)
//! let lines = client.get_cart(&identity).await?;
//! ```

mod cache;
mod client;
pub mod normalize;
pub mod types;

pub use client::BackendClient;
pub use normalize::{NormalizeError, PLACEHOLDER_IMAGE_URL};
pub use types::{Meta, ProductFilters, ProductPage};

use thiserror::Error;

use four_fun_core::{CartLine, LineId, Product, ProductId};

use crate::session::Identity;

/// Errors that can occur when talking to the 4Fun backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (network, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the raw status text.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A single-record payload could not be normalized.
    #[error("Malformed payload: {0}")]
    Malformed(#[from] NormalizeError),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// The remote cart/wishlist boundary the sync orchestrator mutates
/// through. Implemented by [`BackendClient`] and by test fakes.
///
/// All returned payloads are already normalized; quantities passed in are
/// final values (the orchestrator has applied its own floor rules).
pub trait RemoteStore: Send + Sync {
    /// Fetch the authoritative cart snapshot for a user.
    fn get_cart(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<Vec<CartLine>, BackendError>> + Send;

    /// Add a product to the user's cart.
    fn add_to_cart(
        &self,
        identity: &Identity,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Set the quantity of an existing cart line.
    fn update_cart_item(
        &self,
        identity: &Identity,
        line_id: &LineId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Remove a cart line.
    fn remove_from_cart(
        &self,
        identity: &Identity,
        line_id: &LineId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Remove every line from the user's cart.
    fn clear_cart(&self, identity: &Identity)
    -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Fetch the authoritative wishlist for a user.
    fn get_wishlist(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<Vec<Product>, BackendError>> + Send;

    /// Toggle a product's wishlist membership.
    fn toggle_wishlist(
        &self,
        identity: &Identity,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}
