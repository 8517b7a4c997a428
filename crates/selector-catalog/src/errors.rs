//! Error types for the selector catalog

use std::path::PathBuf;
use thiserror::Error;

/// Catalog error enumeration
///
/// Load failures are fatal to the caller: an absent or corrupt catalog has
/// no safe default, because an empty catalog would silently degrade every
/// resolution to heuristics-only.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Durable store could not be read
    #[error("failed to read selector catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Durable store exists but is not a valid key -> selector-list record
    #[error("selector catalog {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// In-memory catalog could not be encoded for persistence
    #[error("failed to encode selector catalog: {0}")]
    Encode(#[source] serde_json::Error),

    /// Durable store could not be written back
    #[error("failed to persist selector catalog {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
