use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::app::{Result, TrawlerError};
use crate::browser::config::BrowserConfig;
use crate::browser::{ElementHandle, PageHandle};

const IS_DISPLAYED_FN: &str = "function() { \
    const rect = this.getBoundingClientRect(); \
    const style = window.getComputedStyle(this); \
    return rect.width > 0 && rect.height > 0 \
        && style.visibility !== 'hidden' && style.display !== 'none'; }";

fn browser_err(context: &str, e: impl std::fmt::Display) -> TrawlerError {
    TrawlerError::Browser(format!("{}: {}", context, e))
}

/// A connected (or launched) Chrome plus the tab collectors drive
pub struct ChromeSession {
    // Dropping the browser closes a launched instance
    _browser: Browser,
    handler: JoinHandle<()>,
    page: ChromePage,
}

impl ChromeSession {
    /// Attach to `debug_url` when configured and reachable, otherwise launch
    pub async fn open(config: &BrowserConfig) -> Result<Self> {
        let (browser, mut handler) = match config.debug_url() {
            Some(debug_url) => {
                let ws_url = probe_debug_endpoint(debug_url, config.probe_timeout()).await?;
                info!("Attaching to browser at {}", debug_url);
                Browser::connect(ws_url)
                    .await
                    .map_err(|e| browser_err("Failed to attach to browser", e))?
            }
            None => {
                let mut builder = LaunchConfig::builder()
                    .arg("--no-sandbox")
                    .arg("--disable-gpu")
                    .arg("--disable-dev-shm-usage")
                    .arg("--disable-software-rasterizer")
                    .window_size(config.window_width, config.window_height);

                if !config.headless {
                    builder = builder.with_head();
                }

                let launch_config = builder
                    .build()
                    .map_err(|e| browser_err("Failed to build browser config", e))?;

                info!("Launching browser (headless: {})", config.headless);
                Browser::launch(launch_config).await.map_err(|e| {
                    TrawlerError::Browser(format!(
                        "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                        e
                    ))
                })?
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        // Reuse the tab the user already has open when attaching
        let existing = browser
            .pages()
            .await
            .map_err(|e| browser_err("Failed to list tabs", e))?;
        let page = match existing.into_iter().next() {
            Some(page) => page,
            None => browser
                .new_page("about:blank")
                .await
                .map_err(|e| browser_err("Failed to create page", e))?,
        };

        if let Some(ref ua) = config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| browser_err("Failed to set user agent", e))?;
        }

        Ok(Self {
            _browser: browser,
            handler,
            page: ChromePage { page },
        })
    }

    pub fn page(&self) -> &ChromePage {
        &self.page
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Resolve the websocket URL advertised by `/json/version`
async fn probe_debug_endpoint(debug_url: &str, timeout: Duration) -> Result<String> {
    let version_url = format!("{}/json/version", debug_url.trim_end_matches('/'));
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client.get(&version_url).send().await.map_err(|e| {
        TrawlerError::Browser(format!(
            "No browser listening at {}: {}. Start Chrome with --remote-debugging-port",
            debug_url, e
        ))
    })?;
    let version: Value = response.error_for_status()?.json().await?;

    version["webSocketDebuggerUrl"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            TrawlerError::Browser(format!("{} did not advertise a websocket URL", version_url))
        })
}

#[derive(Clone)]
pub struct ChromePage {
    page: Page,
}

#[async_trait]
impl PageHandle for ChromePage {
    type Element = ChromeElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| browser_err("Navigation failed", e))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| browser_err("Failed to read URL", e))?;
        Ok(url.unwrap_or_default())
    }

    async fn execute_script(&self, script: &str) -> Result<Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| TrawlerError::Script(format!("Script execution failed: {}", e)))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<ChromeElement>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| browser_err("Query failed", e))?;
        Ok(elements.into_iter().map(ChromeElement).collect())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        self.page
            .save_screenshot(params, path)
            .await
            .map_err(|e| TrawlerError::Capture(format!("Viewport screenshot failed: {}", e)))?;
        Ok(())
    }
}

pub struct ChromeElement(Element);

#[async_trait]
impl ElementHandle for ChromeElement {
    async fn text(&self) -> Result<String> {
        let text = self
            .0
            .inner_text()
            .await
            .map_err(|e| browser_err("Failed to read text", e))?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.0
            .attribute(name)
            .await
            .map_err(|e| browser_err("Failed to read attribute", e))
    }

    async fn is_displayed(&self) -> Result<bool> {
        let returns = self
            .0
            .call_js_fn(IS_DISPLAYED_FN, false)
            .await
            .map_err(|e| TrawlerError::Script(format!("Visibility check failed: {}", e)))?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<Self>> {
        let elements = self
            .0
            .find_elements(selector)
            .await
            .map_err(|e| browser_err("Query failed", e))?;
        Ok(elements.into_iter().map(ChromeElement).collect())
    }

    async fn scroll_into_view(&self) -> Result<()> {
        self.0
            .scroll_into_view()
            .await
            .map_err(|e| browser_err("Scroll into view failed", e))?;
        Ok(())
    }

    async fn click(&self) -> Result<()> {
        self.0
            .click()
            .await
            .map_err(|e| browser_err("Click failed", e))?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.0
            .save_screenshot(CaptureScreenshotFormat::Png, path)
            .await
            .map_err(|e| TrawlerError::Capture(format!("Element screenshot failed: {}", e)))?;
        Ok(())
    }
}
