//! WebDriver-backed browser engine.
//!
//! Spawns a chromedriver process and talks to it through `fantoccini`.
//! Sandboxing is disabled — required for containerized execution where the
//! browser has no user namespace to sandbox into.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use fantoccini::wd::{PrintConfigurationBuilder, PrintMargins, PrintSize};
use fantoccini::{Client, ClientBuilder};
use tracing::{debug, warn};

use super::{Browser, BrowserEngine, Page};
use crate::core::ExportError;

/// Chrome flags for headless printing inside containers.
pub const CHROME_ARGS: &[&str] = &[
    "--headless",
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
];

const DEFAULT_PORT: u16 = 9515;

/// Attempts made while waiting for the driver to accept connections.
const CONNECT_ATTEMPTS: u32 = 20;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Page margins in centimeters (20 mm on each side, matching the HTML
/// template's @page rule).
const PRINT_MARGIN_CM: f64 = 2.0;

/// A4 paper in centimeters, as the WebDriver print endpoint expects.
const A4_SIZE: PrintSize = PrintSize {
    width: 21.0,
    height: 29.7,
};

fn rendering(message: impl Into<String>) -> ExportError {
    ExportError::Rendering(message.into())
}

/// Engine launching chromedriver-driven browser instances.
pub struct WebDriverEngine {
    driver_path: PathBuf,
    port: u16,
}

impl WebDriverEngine {
    /// Engine with the driver binary resolved through the fallback chain.
    pub fn new() -> Self {
        Self {
            driver_path: super::resolve_driver_path(),
            port: DEFAULT_PORT,
        }
    }

    /// Engine with an explicit driver binary and port.
    pub fn with_driver(driver_path: PathBuf, port: u16) -> Self {
        Self { driver_path, port }
    }
}

impl Default for WebDriverEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserEngine for WebDriverEngine {
    async fn launch(&self) -> Result<Box<dyn Browser>, ExportError> {
        let mut driver = tokio::process::Command::new(&self.driver_path)
            .arg(format!("--port={}", self.port))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                rendering(format!(
                    "failed to start chromedriver at {}: {e}",
                    self.driver_path.display()
                ))
            })?;

        let mut capabilities = serde_json::Map::new();
        capabilities.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({ "args": CHROME_ARGS }),
        );
        let url = format!("http://localhost:{}", self.port);

        let mut last_error = String::new();
        for attempt in 0..CONNECT_ATTEMPTS {
            match ClientBuilder::native()
                .capabilities(capabilities.clone())
                .connect(&url)
                .await
            {
                Ok(client) => {
                    debug!(attempt, "webdriver session established");
                    return Ok(Box::new(WebDriverBrowser {
                        client: Some(client),
                        driver,
                    }));
                }
                Err(error) => {
                    last_error = error.to_string();
                    tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                }
            }
        }

        let _ = driver.kill().await;
        Err(rendering(format!(
            "webdriver did not accept a session on {url}: {last_error}"
        )))
    }
}

struct WebDriverBrowser {
    client: Option<Client>,
    driver: tokio::process::Child,
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn new_page(&mut self) -> Result<Box<dyn Page>, ExportError> {
        let client = self
            .client
            .clone()
            .ok_or_else(|| rendering("browser session already closed"))?;
        Ok(Box::new(WebDriverPage { client }))
    }

    async fn close(&mut self) -> Result<(), ExportError> {
        if let Some(client) = self.client.take() {
            if let Err(error) = client.close().await {
                warn!(%error, "webdriver session close failed");
            }
        }
        self.driver
            .kill()
            .await
            .map_err(|e| rendering(format!("failed to kill chromedriver: {e}")))
    }
}

struct WebDriverPage {
    client: Client,
}

#[async_trait]
impl Page for WebDriverPage {
    async fn set_content(&mut self, html: &str, _timeout: Duration) -> Result<(), ExportError> {
        // Data URLs avoid touching the filesystem; the page settles once
        // navigation returns since everything is inline.
        let url = format!("data:text/html;base64,{}", BASE64.encode(html));
        self.client
            .goto(&url)
            .await
            .map_err(|e| rendering(format!("failed to load document HTML: {e}")))
    }

    async fn print_pdf(&mut self) -> Result<Vec<u8>, ExportError> {
        let config = PrintConfigurationBuilder::default()
            .margins(PrintMargins {
                top: PRINT_MARGIN_CM,
                left: PRINT_MARGIN_CM,
                right: PRINT_MARGIN_CM,
                bottom: PRINT_MARGIN_CM,
            })
            .size(A4_SIZE)
            .build()
            .map_err(|e| rendering(format!("invalid print configuration: {e}")))?;
        self.client
            .print(config)
            .await
            .map_err(|e| rendering(format!("PDF printing failed: {e}")))
    }

    async fn close(&mut self) -> Result<(), ExportError> {
        // The page shares the session; leaving the window on about:blank
        // releases the rendered document without tearing the session down.
        self.client
            .goto("about:blank")
            .await
            .map_err(|e| rendering(format!("failed to release page: {e}")))
    }
}
