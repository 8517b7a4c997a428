//! Page query and interaction capability
//!
//! Two narrow contracts over a live browser page:
//! - [`PageProbe`] - the query surface the locator engine consumes (match
//!   counts, visibility, tag category, text content, load waits, diagnostic
//!   screenshots)
//! - [`PageDriver`] - the interaction surface acceptance flows need on top
//!   (navigation, fill, click)
//!
//! Both are implemented by [`CdpProbe`] against a Chromium page driven over
//! the DevTools Protocol. Probe operations may fail transiently; callers are
//! expected to treat such failures as "this attempt did not succeed" rather
//! than aborting.

pub mod cdp;
pub mod errors;
pub mod probe;

pub use cdp::*;
pub use errors::*;
pub use probe::*;
