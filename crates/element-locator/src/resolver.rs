//! Element resolver with catalog cascade and heuristic discovery

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use page_probe::{ElementHandle, LoadCondition, PageProbe, TagCategory, WaitOutcome};
use selector_catalog::SelectorCatalog;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::errors::LocatorError;
use crate::heuristics::heuristic_candidates;

/// Resolver timing and evidence settings.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Per-condition bound for the settle-phase load waits
    pub settle_timeout: Duration,
    /// Fixed delay after the load waits, absorbing late async rendering
    pub quiescence: Duration,
    /// Bound for the best-effort visibility wait after a discovery hit
    pub discovery_wait: Duration,
    /// Directory for failure screenshots
    pub screenshot_dir: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            settle_timeout: Duration::from_secs(10),
            quiescence: Duration::from_secs(2),
            discovery_wait: Duration::from_secs(5),
            screenshot_dir: PathBuf::from("."),
        }
    }
}

/// Where an accepted selector came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Persisted catalog entry
    Catalog,
    /// Heuristic discovery (now promoted into the catalog)
    Heuristic,
}

/// A successfully resolved element.
///
/// Valid only for the current page state; callers use it immediately and
/// discard it, never across navigations.
#[derive(Debug, Clone)]
pub struct ResolvedElement {
    /// Live handle to the first match
    pub handle: ElementHandle,
    /// The selector that produced the match
    pub selector: String,
    /// Which tier accepted it
    pub source: ResolutionSource,
}

/// Resolves logical element keys to live handles.
///
/// Owns no page state: the catalog and probe are injected at construction
/// and every `resolve` call works from the current page.
pub struct ElementResolver {
    catalog: Arc<SelectorCatalog>,
    probe: Arc<dyn PageProbe>,
    config: ResolverConfig,
}

impl ElementResolver {
    /// Create a resolver over `catalog` and `probe`.
    pub fn new(
        catalog: Arc<SelectorCatalog>,
        probe: Arc<dyn PageProbe>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            catalog,
            probe,
            config,
        }
    }

    /// Resolve `key` to a live element handle.
    ///
    /// Tries the catalog's selectors in priority order, then heuristic
    /// discovery, and fails with [`LocatorError::ElementNotFound`] once both
    /// are exhausted. A key unknown to both the catalog and the heuristic
    /// table is a configuration gap and fails immediately, before any
    /// probing.
    pub async fn resolve(
        &self,
        key: &str,
        description: &str,
    ) -> Result<ResolvedElement, LocatorError> {
        let catalog_selectors = self.catalog.get(key);
        let heuristics = heuristic_candidates(key);

        if catalog_selectors.is_none() && heuristics.is_none() {
            warn!(
                "No catalog entry or heuristics for key '{}' ({})",
                key, description
            );
            return Err(LocatorError::not_found(key, description));
        }

        self.settle().await;

        let selectors = catalog_selectors.unwrap_or_default();
        info!(
            "Looking for {} using {} catalog selectors",
            description,
            selectors.len()
        );

        for selector in &selectors {
            if let Some(handle) = self.try_selector(selector, description).await {
                return Ok(ResolvedElement {
                    handle,
                    selector: selector.clone(),
                    source: ResolutionSource::Catalog,
                });
            }
        }

        if let Some(candidates) = heuristics {
            debug!("Catalog exhausted for '{}', trying heuristics", key);
            if let Some(resolved) = self.try_discovery(key, candidates).await? {
                return Ok(resolved);
            }
        }

        self.capture_failure_evidence(key).await;
        warn!(
            "Element '{}' ({}) not found by any strategy",
            key, description
        );
        Err(LocatorError::not_found(key, description))
    }

    /// Settle phase: best-effort load waits plus a fixed quiescence delay.
    /// Never fails the resolution; outcomes are only logged.
    async fn settle(&self) {
        for condition in [LoadCondition::DomContentLoaded, LoadCondition::NetworkIdle] {
            match self
                .probe
                .wait_for_load(condition, self.config.settle_timeout)
                .await
            {
                WaitOutcome::Reached => debug!("Load condition {} reached", condition.name()),
                WaitOutcome::TimedOut => {
                    debug!("Load condition {} timed out, continuing", condition.name())
                }
                WaitOutcome::Failed(reason) => {
                    debug!("Load condition {} wait failed: {}", condition.name(), reason)
                }
            }
        }
        sleep(self.config.quiescence).await;
    }

    /// One catalog-phase selector trial. Any probe error fails the trial and
    /// the cascade moves on; nothing here aborts the resolution.
    async fn try_selector(&self, selector: &str, description: &str) -> Option<ElementHandle> {
        debug!("Trying selector: {}", selector);

        let count = match self.probe.count_matches(selector).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Match count failed for {}: {}", selector, e);
                return None;
            }
        };
        if count == 0 {
            debug!("No elements found for selector: {}", selector);
            return None;
        }
        debug!("Found {} elements for selector: {}", count, selector);

        let handle = match self.probe.first_match(selector).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("First match fetch failed for {}: {}", selector, e);
                return None;
            }
        };

        let visible = match self.probe.is_visible(&handle).await {
            Ok(visible) => visible,
            Err(e) => {
                warn!("Visibility check failed for {}: {}", selector, e);
                false
            }
        };
        if !visible {
            debug!("First match for {} is not visible", selector);
            return None;
        }

        let category = match self.probe.tag_category(&handle).await {
            Ok(category) => category,
            Err(e) => {
                warn!("Tag category read failed for {}: {}", selector, e);
                return None;
            }
        };

        // Input-like controls carry no text; visibility alone accepts them.
        if category == TagCategory::Input {
            info!("Found input element {} via {}", description, selector);
            return Some(handle);
        }

        let content = match self.probe.text_content(&handle).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Text content read failed for {}: {}", selector, e);
                return None;
            }
        };

        match content {
            Some(text) if !text.trim().is_empty() => {
                info!("Found {} using selector: {}", description, selector);
                Some(handle)
            }
            _ => {
                debug!("Element for {} is visible but has no text content", selector);
                None
            }
        }
    }

    /// Discovery phase: first heuristic candidate with any match wins, is
    /// promoted into the catalog (persisted before we return), and is handed
    /// back after a short best-effort visibility wait. The phase-two
    /// visibility/text checks are deliberately not re-run; any match is
    /// enough to make progress against a stale catalog.
    async fn try_discovery(
        &self,
        key: &str,
        candidates: &[&str],
    ) -> Result<Option<ResolvedElement>, LocatorError> {
        for selector in candidates {
            let count = match self.probe.count_matches(selector).await {
                Ok(count) => count,
                Err(e) => {
                    warn!("Heuristic count failed for {}: {}", selector, e);
                    continue;
                }
            };
            if count == 0 {
                debug!("No elements found for heuristic: {}", selector);
                continue;
            }

            self.catalog.promote(key, selector)?;
            info!("Discovered new selector for {}: {}", key, selector);

            let handle = match self.probe.first_match(selector).await {
                Ok(handle) => handle,
                Err(e) => {
                    warn!("First match fetch failed for heuristic {}: {}", selector, e);
                    continue;
                }
            };
            self.wait_for_visible(&handle).await;

            return Ok(Some(ResolvedElement {
                handle,
                selector: selector.to_string(),
                source: ResolutionSource::Heuristic,
            }));
        }
        Ok(None)
    }

    /// Best-effort visibility wait after a discovery hit; never fails.
    async fn wait_for_visible(&self, handle: &ElementHandle) {
        let deadline = Instant::now() + self.config.discovery_wait;
        loop {
            match self.probe.is_visible(handle).await {
                Ok(true) => return,
                Ok(false) => {}
                Err(e) => {
                    debug!("Visibility poll failed for {}: {}", handle.selector(), e);
                }
            }
            if Instant::now() >= deadline {
                debug!(
                    "Gave up waiting for {} to become visible",
                    handle.selector()
                );
                return;
            }
            sleep(Duration::from_millis(100)).await;
        }
    }

    /// Failure phase evidence: screenshot write failure is itself ignored.
    async fn capture_failure_evidence(&self, key: &str) {
        let path = self.config.screenshot_dir.join(format!(
            "error-{}-{}.png",
            key,
            Utc::now().timestamp_millis()
        ));
        match self.probe.capture_screenshot(&path).await {
            Ok(()) => info!("Captured failure screenshot to {}", path.display()),
            Err(e) => warn!("Failure screenshot could not be captured: {}", e),
        }
    }
}
