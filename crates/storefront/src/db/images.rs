//! Storage encoding for product gallery images.
//!
//! The `products.images` column holds a JSON array of URLs as text. Reads
//! never fail on a bad value: an undecodable column is logged as data
//! corruption and surfaces as `null` so that listing pages keep rendering.

use kandahar_core::ProductId;

use super::RepositoryError;

/// Encode gallery images for the `images` column.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if serialization fails.
pub fn encode(images: Option<&[String]>) -> Result<Option<String>, RepositoryError> {
    images
        .map(|urls| {
            serde_json::to_string(urls).map_err(|e| {
                RepositoryError::DataCorruption(format!("cannot encode product images: {e}"))
            })
        })
        .transpose()
}

/// Decode the `images` column, degrading to `None` on malformed data.
#[must_use]
pub fn decode(raw: Option<&str>, product_id: ProductId) -> Option<Vec<String>> {
    let raw = raw?;
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(urls) => Some(urls),
        Err(e) => {
            tracing::warn!(
                product_id = %product_id,
                error = %e,
                "Corrupt images column, returning null"
            );
            None
        }
    }
}
