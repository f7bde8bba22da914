use sheetsync_core::Product;

use crate::error::RowError;

/// Checks that a mapped product carries everything the store requires.
///
/// Only the title is required. Whitespace-only titles pass; the store is the
/// authority on what it will accept.
///
/// # Errors
///
/// Returns [`RowError::Validation`] when the title is missing or empty.
pub fn validate_product(product: &Product) -> Result<(), RowError> {
    match product.title.as_deref() {
        Some(title) if !title.is_empty() => Ok(()),
        _ => Err(RowError::Validation),
    }
}
