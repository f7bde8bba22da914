use sheetsync_catalog::CatalogError;
use sheetsync_core::StateError;
use sheetsync_sheets::SheetError;
use thiserror::Error;

/// Why a single row did not make it into the catalog.
///
/// The `Display` text is what lands in the sheet after the `ERROR: ` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// The mapped product lacks a title; no remote call was made.
    #[error("Invalid product data - missing required fields")]
    Validation,

    /// The store answered, but not with a created product.
    #[error("API Error ({status}): {body}")]
    Remote { status: u16, body: String },

    /// No usable answer from the store (connect, TLS, timeout).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The row could not be turned into a product at all.
    #[error("Mapping failed: {0}")]
    Mapping(String),
}

/// Discriminant of [`RowError`], for assertions and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowErrorKind {
    Validation,
    Remote,
    Transport,
    Mapping,
}

impl RowError {
    #[must_use]
    pub fn kind(&self) -> RowErrorKind {
        match self {
            RowError::Validation => RowErrorKind::Validation,
            RowError::Remote { .. } => RowErrorKind::Remote,
            RowError::Transport(_) => RowErrorKind::Transport,
            RowError::Mapping(_) => RowErrorKind::Mapping,
        }
    }
}

impl From<CatalogError> for RowError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Api { status, body } => RowError::Remote { status, body },
            CatalogError::MalformedResponse { status, body } => RowError::Remote {
                status,
                body: format!("response has no product id: {body}"),
            },
            CatalogError::Http(e) => RowError::Transport(e.to_string()),
            other @ CatalogError::InvalidStoreUrl { .. } => RowError::Transport(other.to_string()),
        }
    }
}

/// Failures that abort a whole invocation.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("source table error: {0}")]
    Sheet(#[from] SheetError),

    #[error("sync state error: {0}")]
    State(#[from] StateError),

    #[error("another sync pass holds the lease")]
    LeaseHeld,
}
