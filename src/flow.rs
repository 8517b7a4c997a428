//! Retail search acceptance flow
//!
//! Drives the storefront the way the scenario steps describe it: open the
//! homepage, run a search (with a bounded retry loop, since the storefront
//! intermittently swallows the first submit), then verify the result list
//! and the first product's price. All element lookups go through the
//! resolution engine so the flow survives markup drift.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use element_locator::ElementResolver;
use page_probe::{ElementHandle, LoadCondition, PageDriver, PageProbe};
use selector_catalog::SelectorCatalog;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::parsers::{parse_price, ParsedPrice};

/// Any of these appearing means the result list rendered.
const RESULT_MARKERS: &[&str] = &[
    "[data-component-type=\"s-search-results\"]",
    ".s-result-list",
    ".s-search-results",
    ".s-main-slot",
    ".s-result-item",
];

/// Explicit empty-result marker.
const NO_RESULTS_MARKER: &str = ".s-no-results-result";

/// Known placements of result titles, scanned in order.
const TITLE_SELECTORS: &[&str] = &[
    ".s-search-results h2 .a-text-normal",
    ".s-result-item h2 .a-link-normal",
    ".s-card-container h2 a",
    "[data-cel-widget*=\"search_result_\"] h2 span",
];

/// Cap on titles read per selector when scanning for a match.
const MAX_SCANNED_TITLES: usize = 12;

/// The search scenario, bound to one page session.
pub struct SearchFlow<P> {
    page: Arc<P>,
    resolver: ElementResolver,
    config: Config,
}

impl<P: PageProbe + PageDriver + 'static> SearchFlow<P> {
    /// Build the flow over a catalog and a live page.
    pub fn new(catalog: Arc<SelectorCatalog>, page: Arc<P>, config: Config) -> Self {
        let resolver = ElementResolver::new(catalog, page.clone(), config.resolver_config());
        Self {
            page,
            resolver,
            config,
        }
    }

    /// Navigate to the storefront homepage and verify it loaded.
    pub async fn open_homepage(&self) -> Result<()> {
        info!("Opening storefront homepage: {}", self.config.base_url);
        self.page
            .goto(&self.config.base_url)
            .await
            .context("homepage navigation failed")?;
        self.settle().await;

        let title = self.page.title().await.context("could not read page title")?;
        if !title.contains(&self.config.expected_title) {
            bail!(
                "unexpected homepage title '{}', wanted it to contain '{}'",
                title,
                self.config.expected_title
            );
        }
        Ok(())
    }

    /// Run a search for `term`, retrying the whole submit sequence up to the
    /// configured attempt count.
    pub async fn run_search(&self, term: &str) -> Result<()> {
        let attempts = self.config.search_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            info!("Search attempt {} of {}", attempt, attempts);
            match self.attempt_search(term).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!("Search attempt {} failed: {:#}", attempt, e);
                    last_error = Some(e);
                    if attempt < attempts {
                        sleep(Duration::from_millis(self.config.retry_pause_ms)).await;
                    }
                }
            }
        }

        match last_error {
            Some(e) => Err(e.context(format!("search failed after {attempts} attempts"))),
            None => bail!("search for '{term}' was never attempted"),
        }
    }

    async fn attempt_search(&self, term: &str) -> Result<()> {
        let search_bar = self
            .resolver
            .resolve("searchBar", "Search input field")
            .await?;
        self.page
            .fill(&search_bar.handle, term)
            .await
            .context("filling the search input failed")?;

        let search_button = self
            .resolver
            .resolve("searchButton", "Search button")
            .await?;
        self.page
            .click(&search_button.handle)
            .await
            .context("clicking the search button failed")?;

        self.settle().await;

        let url = self
            .page
            .current_url()
            .await
            .context("could not read page URL")?;
        if !url.contains("s?k=") && !url.contains("search") {
            bail!("search results URL not reached, still at {url}");
        }
        debug!("Current URL after search: {}", url);

        if !self.wait_for_result_markers().await {
            bail!(
                "no result-list marker appeared within {}ms",
                self.config.marker_timeout_ms
            );
        }
        Ok(())
    }

    /// Verify the result list contains a title matching `term` and return it.
    pub async fn verify_results(&self, term: &str) -> Result<String> {
        if let Ok(count) = self.page.count_matches(NO_RESULTS_MARKER).await {
            if count > 0 {
                bail!("storefront returned no results for '{term}'");
            }
        }

        let needle = term.to_lowercase();
        let mut scanned = Vec::new();

        for selector in TITLE_SELECTORS {
            let count = match self.page.count_matches(selector).await {
                Ok(count) => count,
                Err(e) => {
                    debug!("Title scan failed for {}: {}", selector, e);
                    continue;
                }
            };
            if count == 0 {
                continue;
            }
            debug!("Found {} titles with selector: {}", count, selector);

            for index in 0..count.min(MAX_SCANNED_TITLES) {
                let handle = ElementHandle::new(*selector, index);
                let text = match self.page.text_content(&handle).await {
                    Ok(Some(text)) => text.trim().to_string(),
                    _ => continue,
                };
                if text.is_empty() {
                    continue;
                }
                if text.to_lowercase().contains(&needle) {
                    info!("Found matching title: {}", text);
                    return Ok(text);
                }
                scanned.push(text);
            }
        }

        bail!(
            "no product title containing '{}' found; saw: {}",
            term,
            scanned
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        )
    }

    /// Verify the first product price renders as a well-formed amount.
    pub async fn verify_first_price(&self) -> Result<ParsedPrice> {
        let price = self
            .resolver
            .resolve("firstProductPrice", "First product price")
            .await?;

        let text = self
            .page
            .text_content(&price.handle)
            .await
            .context("could not read price text")?
            .ok_or_else(|| anyhow!("price element has no text content"))?;

        let parsed = parse_price(&text, &self.config.currency_symbol)?;
        info!(
            "Verified price: {} (numeric value: {})",
            parsed.display, parsed.value
        );
        Ok(parsed)
    }

    /// Best-effort settle: bounded load waits, outcomes only logged.
    async fn settle(&self) {
        for condition in [LoadCondition::DomContentLoaded, LoadCondition::NetworkIdle] {
            let outcome = self
                .page
                .wait_for_load(
                    condition,
                    Duration::from_millis(self.config.settle_timeout_ms),
                )
                .await;
            if !outcome.is_reached() {
                debug!(
                    "Load wait {} did not complete: {:?}, continuing",
                    condition.name(),
                    outcome
                );
            }
        }
    }

    /// Poll for any known result-list marker until the configured bound.
    async fn wait_for_result_markers(&self) -> bool {
        let deadline = Instant::now() + Duration::from_millis(self.config.marker_timeout_ms);
        loop {
            for marker in RESULT_MARKERS.iter().chain(std::iter::once(&NO_RESULTS_MARKER)) {
                match self.page.count_matches(marker).await {
                    Ok(count) if count > 0 => {
                        debug!("Result marker present: {}", marker);
                        return true;
                    }
                    Ok(_) => {}
                    Err(e) => debug!("Marker probe failed for {}: {}", marker, e),
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(250)).await;
        }
    }
}
