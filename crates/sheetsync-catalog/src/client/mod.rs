//! HTTP client for the store's Admin REST `products.json` endpoint.

mod origin;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use sheetsync_core::Product;

use crate::error::CatalogError;
use crate::types::{CreateProductRequest, CreateProductResponse, CreatedProduct};
use crate::CatalogApi;

pub use origin::extract_store_origin;

/// Header carrying the Admin API access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Client for creating products through the Admin REST API.
///
/// Every call is a single attempt: no retries, no backoff, no rate-limit
/// handling. A 429 surfaces as [`CatalogError::Api`] like any other
/// non-2xx status.
pub struct ShopifyAdminClient {
    client: Client,
    products_url: String,
    access_token: String,
}

impl ShopifyAdminClient {
    /// Creates a client for `store_url` with the given token and API version.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidStoreUrl`] if no origin can be derived from
    ///   `store_url`.
    /// - [`CatalogError::Http`] if the underlying `reqwest::Client` cannot be
    ///   constructed.
    pub fn new(
        store_url: &str,
        access_token: &str,
        api_version: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, CatalogError> {
        let products_url = Self::products_url(store_url, api_version)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            products_url,
            access_token: access_token.to_owned(),
        })
    }

    /// The fully-qualified create endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.products_url
    }

    /// Builds `<origin>/admin/api/<version>/products.json`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidStoreUrl`] if the origin cannot be
    /// extracted or the API version is blank.
    fn products_url(store_url: &str, api_version: &str) -> Result<String, CatalogError> {
        let origin =
            extract_store_origin(store_url).ok_or_else(|| CatalogError::InvalidStoreUrl {
                store_url: store_url.to_owned(),
                reason: "no scheme and host could be extracted".to_string(),
            })?;
        let version = api_version.trim().trim_matches('/');
        if version.is_empty() {
            return Err(CatalogError::InvalidStoreUrl {
                store_url: store_url.to_owned(),
                reason: "API version is empty".to_string(),
            });
        }
        Ok(format!("{origin}/admin/api/{version}/products.json"))
    }

    /// Creates one product.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Api`] for any non-2xx status, carrying the raw body.
    /// - [`CatalogError::MalformedResponse`] for a 2xx body without a
    ///   `product` object carrying an `id`.
    /// - [`CatalogError::Http`] on network, TLS or timeout failure.
    pub async fn create_product(&self, product: &Product) -> Result<CreatedProduct, CatalogError> {
        let response = self
            .client
            .post(&self.products_url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&CreateProductRequest { product })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CatalogError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let malformed = || CatalogError::MalformedResponse {
            status: status.as_u16(),
            body: body.clone(),
        };

        let parsed: CreateProductResponse =
            serde_json::from_str(&body).map_err(|_| malformed())?;
        let created = parsed
            .product
            .and_then(CreatedProduct::from_product_value)
            .ok_or_else(malformed)?;

        tracing::debug!(product_id = %created.id, "store accepted product");
        Ok(created)
    }
}

#[async_trait]
impl CatalogApi for ShopifyAdminClient {
    async fn create_product(&self, product: &Product) -> Result<CreatedProduct, CatalogError> {
        ShopifyAdminClient::create_product(self, product).await
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
