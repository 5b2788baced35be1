//! Cache types for catalog API responses.
//!
//! Only catalog reads are cached; cart and wishlist snapshots must always
//! be fetched fresh (stale cart data is exactly the bug the original
//! storefront disabled response caching to avoid).

use four_fun_core::Product;

use super::types::ProductPage;

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductPage),
}
