//! PDF rendering through a headless browser.
//!
//! The browser is an external collaborator behind the [`BrowserEngine`] /
//! [`Browser`] / [`Page`] seams: production uses the WebDriver-backed engine
//! in [`webdriver`], tests substitute mocks. The renderer's one hard
//! obligation is resource hygiene — a browser process left behind by a
//! failed render is the primary failure mode under load, so both the page
//! and the browser are closed on every path.

mod driver;
mod webdriver;

pub use driver::{DRIVER_ENV_VAR, DriverLocator, resolve_driver_path};
pub use webdriver::{CHROME_ARGS, WebDriverEngine};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::html::build_document_html;
use crate::core::{ExportData, ExportError};

/// Total budget for navigation plus printing.
pub const RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Shorter budget used by latency-sensitive callers.
pub const FAST_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Launches browser instances.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Browser>, ExportError>;
}

/// A running browser instance.
#[async_trait]
pub trait Browser: Send {
    async fn new_page(&mut self) -> Result<Box<dyn Page>, ExportError>;

    /// Shut the instance down, releasing its OS process.
    async fn close(&mut self) -> Result<(), ExportError>;
}

/// A single browser page.
#[async_trait]
pub trait Page: Send {
    /// Load the given HTML and wait until the page settles.
    async fn set_content(&mut self, html: &str, timeout: Duration) -> Result<(), ExportError>;

    /// Print the current page to PDF bytes.
    async fn print_pdf(&mut self) -> Result<Vec<u8>, ExportError>;

    async fn close(&mut self) -> Result<(), ExportError>;
}

/// Renders export payloads to PDF via a [`BrowserEngine`].
///
/// Each render launches a fresh browser and closes it afterwards. The
/// optional reuse knob keeps one instance across renders as an
/// optimization; [`PdfRenderer::cleanup`] must then run at shutdown so the
/// cached instance follows the same close discipline.
pub struct PdfRenderer {
    engine: Arc<dyn BrowserEngine>,
    timeout: Duration,
    cached: Option<tokio::sync::Mutex<Option<Box<dyn Browser>>>>,
}

impl PdfRenderer {
    pub fn new(engine: Arc<dyn BrowserEngine>) -> Self {
        Self::with_timeout(engine, RENDER_TIMEOUT)
    }

    pub fn with_timeout(engine: Arc<dyn BrowserEngine>, timeout: Duration) -> Self {
        Self {
            engine,
            timeout,
            cached: None,
        }
    }

    /// Keep one browser instance alive between renders.
    pub fn with_browser_reuse(engine: Arc<dyn BrowserEngine>, timeout: Duration) -> Self {
        Self {
            engine,
            timeout,
            cached: Some(tokio::sync::Mutex::new(None)),
        }
    }

    /// Render a document payload.
    pub async fn render(&self, data: &ExportData) -> Result<Vec<u8>, ExportError> {
        let html = build_document_html(data);
        self.render_html(&html).await
    }

    /// Render arbitrary HTML to PDF.
    pub async fn render_html(&self, html: &str) -> Result<Vec<u8>, ExportError> {
        match &self.cached {
            None => {
                let mut browser = self.engine.launch().await?;
                let result = print_page(browser.as_mut(), html, self.timeout).await;
                if let Err(error) = browser.close().await {
                    warn!(%error, "browser close failed after render");
                }
                result
            }
            Some(slot) => {
                let mut slot = slot.lock().await;
                let mut browser = match slot.take() {
                    Some(browser) => {
                        debug!("reusing cached browser instance");
                        browser
                    }
                    None => self.engine.launch().await?,
                };
                let result = print_page(browser.as_mut(), html, self.timeout).await;
                if result.is_ok() {
                    *slot = Some(browser);
                } else if let Err(error) = browser.close().await {
                    warn!(%error, "browser close failed after render error");
                }
                result
            }
        }
    }

    /// Close the cached browser instance, if any.
    pub async fn cleanup(&self) -> Result<(), ExportError> {
        if let Some(slot) = &self.cached {
            if let Some(mut browser) = slot.lock().await.take() {
                debug!("closing cached browser instance");
                browser.close().await?;
            }
        }
        Ok(())
    }
}

/// Open a page, load the HTML and print it, closing the page on every path.
async fn print_page(
    browser: &mut dyn Browser,
    html: &str,
    timeout: Duration,
) -> Result<Vec<u8>, ExportError> {
    let mut page = browser.new_page().await?;
    let printed = tokio::time::timeout(timeout, async {
        page.set_content(html, timeout).await?;
        page.print_pdf().await
    })
    .await
    .unwrap_or_else(|_| {
        Err(ExportError::Rendering(format!(
            "render timed out after {}s",
            timeout.as_secs()
        )))
    });
    if let Err(error) = page.close().await {
        warn!(%error, "page close failed after render");
    }
    printed
}
