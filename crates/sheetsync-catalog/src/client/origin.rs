//! Store URL normalization for the Admin client.

/// Extracts the scheme+host origin from a configured store URL.
///
/// Given `"https://example.myshopify.com/admin"`, returns
/// `"https://example.myshopify.com"`. A bare host such as
/// `"example.myshopify.com"` is assumed to be HTTPS.
///
/// Returns `None` when no origin can be derived.
#[must_use]
pub fn extract_store_origin(store_url: &str) -> Option<String> {
    let trimmed = store_url.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    match reqwest::Url::parse(&with_scheme) {
        Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => {
            Some(url.origin().ascii_serialization())
        }
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(store_url, error = %e, "could not parse store URL");
            None
        }
    }
}
