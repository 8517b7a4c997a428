//! Capability traits and probe types

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ProbeError;

/// Transient reference to one matched element.
///
/// A handle is a selector-plus-index token valid only for the current page
/// state; it must never be cached across navigations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    selector: String,
    index: usize,
}

impl ElementHandle {
    /// Create a handle bound to the `index`-th match of `selector`.
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }

    /// Selector this handle is bound to.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Match index within the selector's result list.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Coarse element category for acceptance checks.
///
/// Input-like controls carry no meaningful text content, so the locator
/// engine accepts them on visibility alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCategory {
    /// Text-entry control (`<input>`)
    Input,
    /// Any other element
    Other,
}

impl TagCategory {
    /// Categorize a lowercase tag name.
    pub fn from_tag_name(tag: &str) -> Self {
        match tag {
            "input" => TagCategory::Input,
            _ => TagCategory::Other,
        }
    }
}

/// Page load condition to wait for during the settle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadCondition {
    /// DOM parsed, subresources may still be loading
    DomContentLoaded,
    /// Document fully loaded and network quiet
    NetworkIdle,
}

impl LoadCondition {
    /// Condition name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            LoadCondition::DomContentLoaded => "domcontentloaded",
            LoadCondition::NetworkIdle => "networkidle",
        }
    }
}

/// Outcome of a bounded best-effort wait.
///
/// Timeouts on the settle path are an expected outcome, not an error, so
/// waits report a tri-state instead of using error control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The condition was observed within the timeout
    Reached,
    /// The timeout elapsed first
    TimedOut,
    /// The underlying wait itself failed
    Failed(String),
}

impl WaitOutcome {
    /// Whether the condition was observed.
    pub fn is_reached(&self) -> bool {
        matches!(self, WaitOutcome::Reached)
    }
}

/// Query surface the locator engine consumes.
///
/// Implementations may be arbitrarily asynchronous internally, but every
/// operation completes or fails within a bounded time; nothing here blocks
/// indefinitely.
#[async_trait]
pub trait PageProbe: Send + Sync {
    /// Number of elements currently matching `selector`.
    async fn count_matches(&self, selector: &str) -> Result<usize, ProbeError>;

    /// Handle to the first element matching `selector`.
    async fn first_match(&self, selector: &str) -> Result<ElementHandle, ProbeError>;

    /// Whether the element is rendered and visible.
    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, ProbeError>;

    /// Coarse tag category of the element.
    async fn tag_category(&self, handle: &ElementHandle) -> Result<TagCategory, ProbeError>;

    /// Text content of the element, `None` when the node has none.
    async fn text_content(&self, handle: &ElementHandle) -> Result<Option<String>, ProbeError>;

    /// Wait (bounded, best-effort) for a page load condition.
    async fn wait_for_load(&self, condition: LoadCondition, timeout: Duration) -> WaitOutcome;

    /// Capture a full-page screenshot to `path`.
    async fn capture_screenshot(&self, path: &Path) -> Result<(), ProbeError>;
}

/// Interaction surface acceptance flows drive on top of the probe.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate the page to `url`.
    async fn goto(&self, url: &str) -> Result<(), ProbeError>;

    /// Current page URL.
    async fn current_url(&self) -> Result<String, ProbeError>;

    /// Current document title.
    async fn title(&self) -> Result<String, ProbeError>;

    /// Replace the element's value with `text`, firing input events.
    async fn fill(&self, handle: &ElementHandle, text: &str) -> Result<(), ProbeError>;

    /// Click the element.
    async fn click(&self, handle: &ElementHandle) -> Result<(), ProbeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_category_from_tag_name() {
        assert_eq!(TagCategory::from_tag_name("input"), TagCategory::Input);
        assert_eq!(TagCategory::from_tag_name("div"), TagCategory::Other);
        assert_eq!(TagCategory::from_tag_name("h2"), TagCategory::Other);
    }

    #[test]
    fn test_handle_accessors() {
        let handle = ElementHandle::new("#search", 0);
        assert_eq!(handle.selector(), "#search");
        assert_eq!(handle.index(), 0);
    }

    #[test]
    fn test_wait_outcome() {
        assert!(WaitOutcome::Reached.is_reached());
        assert!(!WaitOutcome::TimedOut.is_reached());
        assert!(!WaitOutcome::Failed("boom".to_string()).is_reached());
    }

    #[test]
    fn test_load_condition_names() {
        assert_eq!(LoadCondition::DomContentLoaded.name(), "domcontentloaded");
        assert_eq!(LoadCondition::NetworkIdle.name(), "networkidle");
    }
}
