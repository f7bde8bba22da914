use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network, TLS or timeout failure; no usable response arrived.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-2xx status.
    #[error("API Error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The store answered 2xx but the body had no usable `product` object.
    #[error("API Error ({status}): response has no product id: {body}")]
    MalformedResponse { status: u16, body: String },

    #[error("invalid store URL \"{store_url}\": {reason}")]
    InvalidStoreUrl { store_url: String, reason: String },
}

impl CatalogError {
    /// `true` when the failure happened below HTTP (no status to report).
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, CatalogError::Http(_))
    }

    /// The HTTP status the store answered with, if one arrived.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Api { status, .. } | CatalogError::MalformedResponse { status, .. } => {
                Some(*status)
            }
            CatalogError::Http(e) => e.status().map(|s| s.as_u16()),
            CatalogError::InvalidStoreUrl { .. } => None,
        }
    }
}
