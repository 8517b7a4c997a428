//! Error types for page probing

use thiserror::Error;

/// Probe error enumeration
///
/// Every variant is transient from the locator engine's point of view: a
/// failed probe call fails the current selector trial, never the overall
/// resolution.
#[derive(Debug, Error, Clone)]
pub enum ProbeError {
    /// Browser could not be launched or attached
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// Navigation request failed
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// In-page query evaluation failed
    #[error("page query failed: {0}")]
    Query(String),

    /// The handle no longer refers to an attached element
    #[error("stale element handle for selector '{0}'")]
    StaleHandle(String),

    /// Interaction with an element failed
    #[error("page interaction failed: {0}")]
    Interaction(String),

    /// Screenshot capture or write failed
    #[error("screenshot capture failed: {0}")]
    Screenshot(String),
}
