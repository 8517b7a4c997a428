//! Chromium DevTools Protocol implementation
//!
//! Drives a real Chromium page through `chromiumoxide`. All element queries
//! are injected JavaScript expressions evaluated in the page, so a handle is
//! only ever a selector-plus-index token resolved fresh on every probe call.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::ProbeError;
use crate::probe::{
    ElementHandle, LoadCondition, PageDriver, PageProbe, TagCategory, WaitOutcome,
};

/// Browser session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Run Chromium without a visible window
    pub headless: bool,
    /// Initial window size
    pub window_size: Option<(u32, u32)>,
    /// Explicit Chromium binary, when auto-detection is not wanted
    pub chrome_executable: Option<std::path::PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: Some((1280, 800)),
            chrome_executable: None,
        }
    }
}

/// A launched Chromium instance with one page attached.
///
/// Owns the CDP event handler task for the lifetime of the session; dropping
/// the session without calling [`BrowserSession::close`] leaves the browser
/// process to be reaped by the OS.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
}

impl BrowserSession {
    /// Launch Chromium and open a blank page.
    pub async fn launch(config: &SessionConfig) -> Result<Self, ProbeError> {
        let mut builder = BrowserConfig::builder();

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some((width, height)) = config.window_size {
            builder = builder.window_size(width, height);
        }
        if let Some(ref path) = config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder.build().map_err(ProbeError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ProbeError::Launch(e.to_string()))?;

        // The handler stream must be polled for the CDP connection to make
        // progress; it ends when the browser goes away.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ProbeError::Launch(e.to_string()))?;

        debug!("Browser session launched (headless={})", config.headless);

        Ok(Self {
            browser,
            handler_task,
            page,
        })
    }

    /// Probe bound to this session's page.
    pub fn probe(&self) -> CdpProbe {
        CdpProbe::new(self.page.clone())
    }

    /// Close the browser and stop the event handler.
    pub async fn close(mut self) -> Result<(), ProbeError> {
        let result = self
            .browser
            .close()
            .await
            .map_err(|e| ProbeError::Launch(e.to_string()));
        self.handler_task.abort();
        result.map(|_| ())
    }
}

fn as_interaction(err: ProbeError) -> ProbeError {
    match err {
        ProbeError::Query(msg) => ProbeError::Interaction(msg),
        other => other,
    }
}

/// [`PageProbe`] and [`PageDriver`] over a live CDP page.
#[derive(Clone)]
pub struct CdpProbe {
    page: Page,
}

impl CdpProbe {
    /// Wrap an attached page.
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    async fn eval<T: DeserializeOwned>(&self, expression: &str) -> Result<T, ProbeError> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|e| ProbeError::Query(e.to_string()))?;
        result
            .into_value::<T>()
            .map_err(|e| ProbeError::Query(e.to_string()))
    }

    fn element_expr(handle: &ElementHandle) -> String {
        format!(
            "document.querySelectorAll({:?})[{}]",
            handle.selector(),
            handle.index()
        )
    }
}

#[async_trait]
impl PageProbe for CdpProbe {
    async fn count_matches(&self, selector: &str) -> Result<usize, ProbeError> {
        self.eval(&format!(
            "document.querySelectorAll({:?}).length",
            selector
        ))
        .await
    }

    async fn first_match(&self, selector: &str) -> Result<ElementHandle, ProbeError> {
        let count: usize = self
            .eval(&format!(
                "document.querySelectorAll({:?}).length",
                selector
            ))
            .await?;
        if count == 0 {
            return Err(ProbeError::StaleHandle(selector.to_string()));
        }
        Ok(ElementHandle::new(selector, 0))
    }

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, ProbeError> {
        let expr = format!(
            "(() => {{ \
                const el = {}; \
                if (!el) return false; \
                const rect = el.getBoundingClientRect(); \
                const style = window.getComputedStyle(el); \
                return rect.width > 0 && rect.height > 0 \
                    && style.visibility !== 'hidden' && style.display !== 'none'; \
            }})()",
            Self::element_expr(handle)
        );
        self.eval(&expr).await
    }

    async fn tag_category(&self, handle: &ElementHandle) -> Result<TagCategory, ProbeError> {
        let expr = format!(
            "(() => {{ const el = {}; return el ? el.tagName.toLowerCase() : null; }})()",
            Self::element_expr(handle)
        );
        let tag: Option<String> = self.eval(&expr).await?;
        match tag {
            Some(tag) => Ok(TagCategory::from_tag_name(&tag)),
            None => Err(ProbeError::StaleHandle(handle.selector().to_string())),
        }
    }

    async fn text_content(&self, handle: &ElementHandle) -> Result<Option<String>, ProbeError> {
        let expr = format!(
            "(() => {{ const el = {}; return el ? el.textContent : null; }})()",
            Self::element_expr(handle)
        );
        self.eval(&expr).await
    }

    async fn wait_for_load(&self, condition: LoadCondition, timeout: Duration) -> WaitOutcome {
        // Network idle has no direct in-page signal; the window load event is
        // the closest bounded equivalent.
        let expr = match condition {
            LoadCondition::DomContentLoaded => {
                "new Promise(resolve => { \
                    if (document.readyState === 'interactive' || document.readyState === 'complete') { resolve(true); } \
                    else { document.addEventListener('DOMContentLoaded', () => resolve(true), { once: true }); } \
                })"
            }
            LoadCondition::NetworkIdle => {
                "new Promise(resolve => { \
                    if (document.readyState === 'complete') { resolve(true); } \
                    else { window.addEventListener('load', () => resolve(true), { once: true }); } \
                })"
            }
        };

        match tokio::time::timeout(timeout, self.page.evaluate(expr)).await {
            Err(_) => WaitOutcome::TimedOut,
            Ok(Err(e)) => WaitOutcome::Failed(e.to_string()),
            Ok(Ok(_)) => WaitOutcome::Reached,
        }
    }

    async fn capture_screenshot(&self, path: &Path) -> Result<(), ProbeError> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();

        let response = self
            .page
            .execute(params)
            .await
            .map_err(|e| ProbeError::Screenshot(e.to_string()))?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&response.data)
            .map_err(|e| ProbeError::Screenshot(e.to_string()))?;

        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| ProbeError::Screenshot(e.to_string()))?;

        debug!("Captured screenshot to {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl PageDriver for CdpProbe {
    async fn goto(&self, url: &str) -> Result<(), ProbeError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ProbeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ProbeError> {
        self.eval("window.location.href").await
    }

    async fn title(&self) -> Result<String, ProbeError> {
        self.eval("document.title").await
    }

    async fn fill(&self, handle: &ElementHandle, text: &str) -> Result<(), ProbeError> {
        let expr = format!(
            "(() => {{ \
                const el = {}; \
                if (!el) return false; \
                el.focus(); \
                el.value = {:?}; \
                el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                return true; \
            }})()",
            Self::element_expr(handle),
            text
        );
        let filled: bool = self.eval(&expr).await.map_err(as_interaction)?;
        if !filled {
            warn!("Fill target vanished: {}", handle.selector());
            return Err(ProbeError::StaleHandle(handle.selector().to_string()));
        }
        Ok(())
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), ProbeError> {
        let expr = format!(
            "(() => {{ const el = {}; if (!el) return false; el.click(); return true; }})()",
            Self::element_expr(handle)
        );
        let clicked: bool = self.eval(&expr).await.map_err(as_interaction)?;
        if !clicked {
            warn!("Click target vanished: {}", handle.selector());
            return Err(ProbeError::StaleHandle(handle.selector().to_string()));
        }
        Ok(())
    }
}
