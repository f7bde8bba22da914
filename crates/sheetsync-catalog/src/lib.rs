//! Outbound catalog boundary: turning a [`Product`] into a remote product.

pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;
use sheetsync_core::Product;

pub use client::{extract_store_origin, ShopifyAdminClient, ACCESS_TOKEN_HEADER};
pub use error::CatalogError;
pub use types::CreatedProduct;

/// Anything that can create a product remotely in a single attempt.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Creates `product` and returns the identifier the catalog assigned.
    async fn create_product(&self, product: &Product) -> Result<CreatedProduct, CatalogError>;
}
