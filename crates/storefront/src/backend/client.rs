//! REST client for the 4Fun backend API.
//!
//! Uses `reqwest` with JSON bodies and bearer-token auth. Catalog reads
//! are cached via `moka`; cart and wishlist endpoints are always fetched
//! fresh.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::Method;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use four_fun_core::{CartLine, LineId, Product, ProductId};

use crate::config::StoreConfig;
use crate::session::Identity;

use super::cache::CacheValue;
use super::normalize::{normalize, normalize_lines, normalize_products};
use super::types::{Meta, ProductFilters, ProductPage};
use super::{BackendError, RemoteStore};

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the 4Fun backend REST API.
///
/// Cheaply cloneable; catalog responses are cached per client (shared
/// across clones).
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: url::Url,
    cache: Cache<String, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.catalog_cache_capacity)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_base_url.clone(),
                cache,
            }),
        }
    }

    /// Execute a request and parse the JSON response body.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        identity: Option<&Identity>,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value, BackendError> {
        let url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| BackendError::Api {
                status: 0,
                message: format!("invalid request path {path}: {e}"),
            })?;

        let mut request = self.inner.client.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(identity) = identity {
            request = request.bearer_auth(identity.token().expose_secret());
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            let message = error_message(&response_text, status);
            tracing::error!(
                status = %status,
                message = %message,
                "Backend returned non-success status"
            );
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        match serde_json::from_str(&response_text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse backend response"
                );
                Err(BackendError::Parse(e))
            }
        }
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload cannot be
    /// normalized into a product.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let raw = self
            .execute(Method::GET, &format!("/api/products/{id}"), None, &[], None)
            .await?;
        let product = normalize(&raw)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List catalog products with optional pagination and search filters.
    ///
    /// Tolerates both the `{data, meta}` envelope and a bare JSON array;
    /// malformed records inside the list are dropped, not fatal.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filters: &ProductFilters,
    ) -> Result<ProductPage, BackendError> {
        let cache_key = format!("products:{}", filters.cache_key());

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product listing");
            return Ok(page);
        }

        let raw = self
            .execute(Method::GET, "/api/products", None, &filters.to_query(), None)
            .await?;
        let page = parse_product_page(&raw);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }
}

/// Extract a human-readable message from an error body.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(Value::as_str)
        .map_or_else(
            || format!("HTTP {status}: {}", body.chars().take(200).collect::<String>()),
            ToString::to_string,
        )
}

/// Parse a product listing, accepting both response shapes the backend
/// has shipped: `{data: [...], meta: {...}}` and a bare array.
fn parse_product_page(raw: &Value) -> ProductPage {
    if let Some(data) = raw.get("data").and_then(Value::as_array) {
        let meta = raw
            .get("meta")
            .and_then(|meta| serde_json::from_value(meta.clone()).ok())
            .unwrap_or_default();
        return ProductPage {
            items: normalize_products(data),
            meta,
        };
    }

    let items = raw.as_array().map(|list| normalize_products(list)).unwrap_or_default();
    ProductPage {
        items,
        meta: Meta::default(),
    }
}

// =============================================================================
// RemoteStore implementation
// =============================================================================

impl RemoteStore for BackendClient {
    #[instrument(skip(self, identity), fields(user = %identity.user_id))]
    async fn get_cart(&self, identity: &Identity) -> Result<Vec<CartLine>, BackendError> {
        let raw = self
            .execute(
                Method::GET,
                &format!("/api/cart/{}", identity.user_id),
                Some(identity),
                &[],
                None,
            )
            .await?;

        let items = raw
            .get("cart")
            .and_then(|cart| cart.get("items"))
            .and_then(Value::as_array);

        Ok(items.map(|list| normalize_lines(list)).unwrap_or_default())
    }

    async fn add_to_cart(
        &self,
        identity: &Identity,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        self.execute(
            Method::POST,
            "/api/cart",
            Some(identity),
            &[],
            Some(json!({
                "userId": identity.user_id.as_str(),
                "productId": product_id.as_str(),
                "quantity": quantity,
            })),
        )
        .await?;
        Ok(())
    }

    async fn update_cart_item(
        &self,
        identity: &Identity,
        line_id: &LineId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        self.execute(
            Method::PUT,
            "/api/cart",
            Some(identity),
            &[],
            Some(json!({
                "userId": identity.user_id.as_str(),
                "itemId": line_id.as_str(),
                "quantity": quantity,
            })),
        )
        .await?;
        Ok(())
    }

    async fn remove_from_cart(
        &self,
        identity: &Identity,
        line_id: &LineId,
    ) -> Result<(), BackendError> {
        self.execute(
            Method::DELETE,
            &format!("/api/cart/{}/{}", identity.user_id, line_id),
            Some(identity),
            &[],
            None,
        )
        .await?;
        Ok(())
    }

    async fn clear_cart(&self, identity: &Identity) -> Result<(), BackendError> {
        self.execute(
            Method::DELETE,
            &format!("/api/cart/{}", identity.user_id),
            Some(identity),
            &[],
            None,
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, identity), fields(user = %identity.user_id))]
    async fn get_wishlist(&self, identity: &Identity) -> Result<Vec<Product>, BackendError> {
        let raw = self
            .execute(
                Method::GET,
                &format!("/api/wishlist/{}", identity.user_id),
                Some(identity),
                &[],
                None,
            )
            .await?;

        let items = raw.get("wishlist").and_then(Value::as_array);
        Ok(items.map(|list| normalize_products(list)).unwrap_or_default())
    }

    async fn toggle_wishlist(
        &self,
        identity: &Identity,
        product_id: &ProductId,
    ) -> Result<(), BackendError> {
        self.execute(
            Method::POST,
            "/api/wishlist/toggle",
            Some(identity),
            &[],
            Some(json!({
                "userId": identity.user_id.as_str(),
                "productId": product_id.as_str(),
            })),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_product_page_enveloped() {
        let page = parse_product_page(&json!({
            "data": [
                { "_id": "1", "nombre": "Keep" },
                "garbage",
            ],
            "meta": { "total": 42, "page": 2, "limit": 10, "totalPages": 5 },
        }));

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.meta.total, 42);
        assert_eq!(page.meta.page, 2);
    }

    #[test]
    fn test_parse_product_page_bare_array() {
        let page = parse_product_page(&json!([
            { "_id": "1", "nombre": "A" },
            { "_id": "2", "nombre": "B" },
        ]));

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.meta, Meta::default());
    }

    #[test]
    fn test_parse_product_page_unexpected_shape() {
        let page = parse_product_page(&json!({ "surprise": true }));
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_error_message_prefers_body_message() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(
            error_message(r#"{"message": "no such product"}"#, status),
            "no such product"
        );
        assert!(error_message("<html>oops</html>", status).starts_with("HTTP 400"));
    }
}
