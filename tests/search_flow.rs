//! End-to-end search flow against a scripted page.
//!
//! Exercises the whole harness (resolution cascade included) with no real
//! browser: the page is a state machine that renders the homepage, swallows
//! a configurable number of submit clicks, then renders the result list.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use page_probe::{
    ElementHandle, LoadCondition, PageDriver, PageProbe, ProbeError, TagCategory, WaitOutcome,
};
use selector_catalog::SelectorCatalog;
use shopcheck_cli::config::Config;
use shopcheck_cli::flow::SearchFlow;
use tempfile::NamedTempFile;

const SEARCH_BAR: &str = "#twotabsearchtextbox";
const SEARCH_BUTTON: &str = "#nav-search-submit-button";
const RESULT_MARKER: &str = ".s-result-item";
const TITLE_SELECTOR: &str = ".s-search-results h2 .a-text-normal";
const PRICE_SELECTOR: &str = ".s-result-item .a-price";

#[derive(Debug, Clone)]
struct FakeElement {
    visible: bool,
    tag: &'static str,
    // One entry per match; the match count is the length.
    texts: Vec<&'static str>,
}

#[derive(Debug, Default)]
struct PageState {
    url: String,
    title: String,
    elements: HashMap<&'static str, FakeElement>,
    filled: Option<String>,
    clicks_to_swallow: u32,
}

struct ScriptedPage {
    state: Mutex<PageState>,
}

impl ScriptedPage {
    fn homepage(clicks_to_swallow: u32) -> Self {
        let mut elements = HashMap::new();
        elements.insert(
            SEARCH_BAR,
            FakeElement {
                visible: true,
                tag: "input",
                texts: vec![""],
            },
        );
        elements.insert(
            SEARCH_BUTTON,
            FakeElement {
                visible: true,
                tag: "input",
                texts: vec![""],
            },
        );

        Self {
            state: Mutex::new(PageState {
                url: "https://www.amazon.com/".to_string(),
                title: "Amazon.com. Spend less. Smile more.".to_string(),
                elements,
                filled: None,
                clicks_to_swallow,
            }),
        }
    }

    fn render_results(state: &mut PageState) {
        let term = state.filled.clone().unwrap_or_default();
        state.url = format!("https://www.amazon.com/s?k={term}");
        state.title = format!("Amazon.com : {term}");
        state.elements.clear();
        state.elements.insert(
            RESULT_MARKER,
            FakeElement {
                visible: true,
                tag: "div",
                texts: vec!["result", "result", "result"],
            },
        );
        state.elements.insert(
            TITLE_SELECTOR,
            FakeElement {
                visible: true,
                tag: "span",
                texts: vec!["Gaming Laptop 15 inch", "Desk Lamp with USB Port"],
            },
        );
        state.elements.insert(
            PRICE_SELECTOR,
            FakeElement {
                visible: true,
                tag: "span",
                texts: vec!["$24.99"],
            },
        );
    }

    fn filled_text(&self) -> Option<String> {
        self.state.lock().unwrap().filled.clone()
    }

    fn element(&self, selector: &str) -> Option<FakeElement> {
        self.state.lock().unwrap().elements.get(selector).cloned()
    }
}

#[async_trait]
impl PageProbe for ScriptedPage {
    async fn count_matches(&self, selector: &str) -> Result<usize, ProbeError> {
        Ok(self.element(selector).map(|e| e.texts.len()).unwrap_or(0))
    }

    async fn first_match(&self, selector: &str) -> Result<ElementHandle, ProbeError> {
        match self.element(selector) {
            Some(e) if !e.texts.is_empty() => Ok(ElementHandle::new(selector, 0)),
            _ => Err(ProbeError::StaleHandle(selector.to_string())),
        }
    }

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, ProbeError> {
        Ok(self
            .element(handle.selector())
            .map(|e| e.visible)
            .unwrap_or(false))
    }

    async fn tag_category(&self, handle: &ElementHandle) -> Result<TagCategory, ProbeError> {
        match self.element(handle.selector()) {
            Some(e) => Ok(TagCategory::from_tag_name(e.tag)),
            None => Err(ProbeError::StaleHandle(handle.selector().to_string())),
        }
    }

    async fn text_content(&self, handle: &ElementHandle) -> Result<Option<String>, ProbeError> {
        match self.element(handle.selector()) {
            Some(e) => Ok(e.texts.get(handle.index()).map(|t| t.to_string())),
            None => Err(ProbeError::StaleHandle(handle.selector().to_string())),
        }
    }

    async fn wait_for_load(&self, _condition: LoadCondition, _timeout: Duration) -> WaitOutcome {
        WaitOutcome::Reached
    }

    async fn capture_screenshot(&self, _path: &Path) -> Result<(), ProbeError> {
        Ok(())
    }
}

#[async_trait]
impl PageDriver for ScriptedPage {
    async fn goto(&self, url: &str) -> Result<(), ProbeError> {
        self.state.lock().unwrap().url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ProbeError> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn title(&self) -> Result<String, ProbeError> {
        Ok(self.state.lock().unwrap().title.clone())
    }

    async fn fill(&self, handle: &ElementHandle, text: &str) -> Result<(), ProbeError> {
        let mut state = self.state.lock().unwrap();
        if !state.elements.contains_key(handle.selector()) {
            return Err(ProbeError::StaleHandle(handle.selector().to_string()));
        }
        state.filled = Some(text.to_string());
        Ok(())
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), ProbeError> {
        let mut state = self.state.lock().unwrap();
        if !state.elements.contains_key(handle.selector()) {
            return Err(ProbeError::StaleHandle(handle.selector().to_string()));
        }
        if handle.selector() == SEARCH_BUTTON {
            if state.clicks_to_swallow > 0 {
                state.clicks_to_swallow -= 1;
            } else {
                ScriptedPage::render_results(&mut state);
            }
        }
        Ok(())
    }
}

fn test_catalog() -> (NamedTempFile, Arc<SelectorCatalog>) {
    let mut file = NamedTempFile::new().unwrap();
    let json = format!(
        r#"{{
            "searchBar": ["{SEARCH_BAR}"],
            "searchButton": ["{SEARCH_BUTTON}"],
            "productTitle": ["{TITLE_SELECTOR}"],
            "firstProductPrice": ["{PRICE_SELECTOR}"]
        }}"#
    );
    file.write_all(json.as_bytes()).unwrap();
    let catalog = Arc::new(SelectorCatalog::load(file.path()).unwrap());
    (file, catalog)
}

fn test_config() -> Config {
    Config {
        settle_timeout_ms: 5,
        quiescence_ms: 0,
        discovery_wait_ms: 0,
        marker_timeout_ms: 100,
        search_attempts: 2,
        retry_pause_ms: 0,
        screenshot_dir: std::env::temp_dir(),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_full_scenario_passes() {
    let (_file, catalog) = test_catalog();
    let page = Arc::new(ScriptedPage::homepage(0));
    let flow = SearchFlow::new(catalog, page.clone(), test_config());

    flow.open_homepage().await.unwrap();
    flow.run_search("laptop").await.unwrap();
    assert_eq!(page.filled_text().as_deref(), Some("laptop"));

    let title = flow.verify_results("laptop").await.unwrap();
    assert_eq!(title, "Gaming Laptop 15 inch");

    let price = flow.verify_first_price().await.unwrap();
    assert_eq!(price.value, 24.99);
    assert_eq!(price.display, "$24.99");
}

#[tokio::test]
async fn test_search_retries_after_swallowed_click() {
    let (_file, catalog) = test_catalog();
    let page = Arc::new(ScriptedPage::homepage(1));
    let flow = SearchFlow::new(catalog, page.clone(), test_config());

    flow.open_homepage().await.unwrap();
    flow.run_search("laptop").await.unwrap();

    let url = page.state.lock().unwrap().url.clone();
    assert!(url.contains("s?k=laptop"));
}

#[tokio::test]
async fn test_search_gives_up_after_configured_attempts() {
    let (_file, catalog) = test_catalog();
    let page = Arc::new(ScriptedPage::homepage(u32::MAX));
    let flow = SearchFlow::new(catalog, page, test_config());

    flow.open_homepage().await.unwrap();
    let err = flow.run_search("laptop").await.unwrap_err();
    assert!(err.to_string().contains("after 2 attempts"));
}

#[tokio::test]
async fn test_homepage_title_mismatch_fails() {
    let (_file, catalog) = test_catalog();
    let page = Arc::new(ScriptedPage::homepage(0));
    page.state.lock().unwrap().title = "Robot Check".to_string();
    let flow = SearchFlow::new(catalog, page, test_config());

    let err = flow.open_homepage().await.unwrap_err();
    assert!(err.to_string().contains("unexpected homepage title"));
}

#[tokio::test]
async fn test_results_without_matching_title_fail() {
    let (_file, catalog) = test_catalog();
    let page = Arc::new(ScriptedPage::homepage(0));
    let flow = SearchFlow::new(catalog, page, test_config());

    flow.open_homepage().await.unwrap();
    flow.run_search("toaster").await.unwrap();

    let err = flow.verify_results("toaster").await.unwrap_err();
    assert!(err.to_string().contains("no product title containing"));
}
