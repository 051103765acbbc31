//! Capability interface over a remote-controlled browser.
//!
//! Collectors only ever talk to a [`PageHandle`] and the [`ElementHandle`]s it
//! returns. The chromiumoxide adapter ([`ChromeSession`]) is the production
//! implementation; tests drive the same code through a scripted DOM.
//!
//! ```text
//! Collector → PageHandle::find_elements → ElementHandle::{text, attribute, screenshot}
//! ```

mod chrome;
mod config;
#[cfg(test)]
pub(crate) mod testing;

pub use chrome::{ChromeElement, ChromePage, ChromeSession};
pub use config::BrowserConfig;

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::app::{Result, TrawlerError};

pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight); true";
pub const VIEWPORT_HEIGHT: &str = "window.innerHeight";

/// One node of the live DOM.
///
/// Handles go stale when the page virtualizes or re-renders the node, so
/// every accessor can fail independently.
#[async_trait]
pub trait ElementHandle: Send + Sync + Sized {
    /// Rendered text (`innerText`)
    async fn text(&self) -> Result<String>;

    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    async fn is_displayed(&self) -> Result<bool>;

    /// Descendants matching a CSS selector
    async fn find_elements(&self, selector: &str) -> Result<Vec<Self>>;

    async fn scroll_into_view(&self) -> Result<()>;

    async fn click(&self) -> Result<()>;

    /// Element-scoped PNG written to `path`
    async fn screenshot(&self, path: &Path) -> Result<()>;
}

/// The single tab a collection run drives
#[async_trait]
pub trait PageHandle: Send + Sync {
    type Element: ElementHandle;

    async fn navigate(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Evaluate a script in the page and return its JSON value
    async fn execute_script(&self, script: &str) -> Result<Value>;

    async fn find_elements(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// Viewport PNG written to `path`
    async fn screenshot(&self, path: &Path) -> Result<()>;

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.execute_script(SCROLL_TO_BOTTOM).await.map(|_| ())
    }

    async fn scroll_by(&self, pixels: i64) -> Result<()> {
        self.execute_script(&scroll_by_script(pixels))
            .await
            .map(|_| ())
    }

    async fn viewport_height(&self) -> Result<f64> {
        number(self.execute_script(VIEWPORT_HEIGHT).await?, VIEWPORT_HEIGHT)
    }
}

pub fn scroll_by_script(pixels: i64) -> String {
    format!("window.scrollBy(0, {}); true", pixels)
}

fn number(value: Value, script: &str) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| TrawlerError::Script(format!("`{}` returned {}", script, value)))
}
