//! Resilient element resolution
//!
//! Resolves logical element keys against third-party, unversioned markup
//! with a three-tier cascade:
//! - Catalog cascade (persisted, priority-ordered selectors per key)
//! - Heuristic discovery (compiled-in candidates, promoted on success)
//! - Hard failure with diagnostic evidence
//!
//! Successful discoveries are written back to the catalog before the handle
//! is returned, so every heuristic hit becomes a cheap catalog hit for all
//! future runs.

pub mod errors;
pub mod heuristics;
pub mod resolver;

pub use errors::*;
pub use heuristics::*;
pub use resolver::*;
