//! Admin REST request and response envelopes for `products.json`.
//!
//! ### Request
//! `POST /admin/api/{version}/products.json` with body `{"product": {...}}`.
//! The product fields are [`sheetsync_core::Product`] serialized as-is.
//!
//! ### Response
//! On success the store echoes the created product under a top-level
//! `product` key, including the numeric `id` it assigned. Validation
//! failures come back as 422 with an `errors` object, e.g.
//! `{"errors":{"title":["can't be blank"]}}`; that body is surfaced verbatim.

use serde::{Deserialize, Serialize};
use sheetsync_core::Product;

/// Request body for product creation.
#[derive(Debug, Serialize)]
pub struct CreateProductRequest<'a> {
    pub product: &'a Product,
}

/// Response body for product creation. `product` is absent on error bodies.
#[derive(Debug, Deserialize)]
pub struct CreateProductResponse {
    #[serde(default)]
    pub product: Option<serde_json::Value>,
}

/// A product the store accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedProduct {
    /// Store-assigned identifier, rendered as text (`"7243582963812"`).
    pub id: String,
    /// The full product object the store returned.
    pub data: serde_json::Value,
}

impl CreatedProduct {
    /// Extracts the identifier from a returned product object.
    ///
    /// Accepts numeric or string ids; anything else is treated as missing.
    #[must_use]
    pub fn from_product_value(data: serde_json::Value) -> Option<Self> {
        let id = match data.get("id")? {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) if !s.is_empty() => s.clone(),
            _ => return None,
        };
        Some(Self { id, data })
    }
}
