//! Error types for element resolution

use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error)]
pub enum LocatorError {
    /// Every strategy was exhausted without an acceptable match.
    ///
    /// The only error the engine raises deliberately; it carries the key and
    /// human-readable description so an operator can diagnose markup drift
    /// from the log and the failure screenshot.
    #[error("unable to find element \"{description}\" (key '{key}') with any known selector")]
    ElementNotFound { key: String, description: String },

    /// The catalog could not persist a discovered selector
    #[error(transparent)]
    Catalog(#[from] selector_catalog::CatalogError),
}

impl LocatorError {
    /// Construct the exhaustion error for `key`.
    pub fn not_found(key: &str, description: &str) -> Self {
        LocatorError::ElementNotFound {
            key: key.to_string(),
            description: description.to_string(),
        }
    }
}
