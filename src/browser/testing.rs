//! Scripted in-memory page for exercising collectors without a browser.
//!
//! A [`SimPage`] holds one DOM snapshot per scroll position. Each scroll
//! advances the position; queries past the last snapshot keep returning it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::app::{Result, TrawlerError};
use crate::browser::{ElementHandle, PageHandle, SCROLL_TO_BOTTOM, VIEWPORT_HEIGHT};

pub const POST_SELECTOR: &str = r#"article[data-testid="tweet"]"#;

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Navigate(String),
    Query { position: usize },
    ScrollIntoView(String),
    ElementShot(String),
    PageShot(PathBuf),
    Scroll,
}

type EventLog = Arc<Mutex<Vec<SimEvent>>>;

#[derive(Debug, Clone, Default)]
pub struct SimElement {
    pub id: String,
    text: String,
    attrs: HashMap<String, String>,
    hidden: bool,
    children: HashMap<String, Vec<SimElement>>,
    fail_text: bool,
    fail_screenshot: bool,
    log: Option<EventLog>,
}

impl SimElement {
    pub fn node(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    /// A post shaped the way the default selectors expect
    pub fn post(id: &str) -> Self {
        let author = format!("user{}", id);
        Self {
            id: id.to_string(),
            text: format!("User {}\n@{}\npost body {}", id, author, id),
            ..Default::default()
        }
        .with_child(r#"[data-testid="tweetText"]"#, Self::node(&format!("post body {}", id)))
        .with_child(
            r#"a[href*="/status/"]"#,
            Self::node("").with_attr("href", &format!("/{}/status/{}", author, id)),
        )
        .with_child(
            r#"[data-testid="User-Name"] a"#,
            Self::node(&format!("User {}", id)),
        )
        .with_child(
            "time",
            Self::node("2h").with_attr("datetime", "2024-05-01T12:00:00.000Z"),
        )
    }

    pub fn promoted(mut self) -> Self {
        self.text.push_str("\nAd");
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_child(mut self, selector: &str, child: SimElement) -> Self {
        self.children
            .entry(selector.to_string())
            .or_default()
            .push(child);
        self
    }

    pub fn without(mut self, selector: &str) -> Self {
        self.children.remove(selector);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn failing_text(mut self) -> Self {
        self.fail_text = true;
        self
    }

    pub fn failing_screenshot(mut self) -> Self {
        self.fail_screenshot = true;
        self
    }

    fn attach(&self, log: &EventLog) -> Self {
        let mut element = self.clone();
        element.log = Some(log.clone());
        element
    }

    fn record(&self, event: SimEvent) {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(event);
        }
    }
}

#[async_trait]
impl ElementHandle for SimElement {
    async fn text(&self) -> Result<String> {
        if self.fail_text {
            return Err(TrawlerError::Browser("stale element".into()));
        }
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.attrs.get(name).cloned())
    }

    async fn is_displayed(&self) -> Result<bool> {
        Ok(!self.hidden)
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<Self>> {
        let children = self.children.get(selector).cloned().unwrap_or_default();
        Ok(match &self.log {
            Some(log) => children.iter().map(|c| c.attach(log)).collect(),
            None => children,
        })
    }

    async fn scroll_into_view(&self) -> Result<()> {
        self.record(SimEvent::ScrollIntoView(self.id.clone()));
        Ok(())
    }

    async fn click(&self) -> Result<()> {
        Ok(())
    }

    async fn screenshot(&self, _path: &Path) -> Result<()> {
        if self.fail_screenshot {
            return Err(TrawlerError::Capture("element detached".into()));
        }
        self.record(SimEvent::ElementShot(self.id.clone()));
        Ok(())
    }
}

struct SimState {
    position: usize,
    url: String,
    failing_navigations: u32,
}

pub struct SimPage {
    snapshots: Vec<Vec<SimElement>>,
    state: Mutex<SimState>,
    log: EventLog,
}

impl SimPage {
    pub fn new(snapshots: Vec<Vec<SimElement>>) -> Self {
        Self {
            snapshots,
            state: Mutex::new(SimState {
                position: 0,
                url: "about:blank".to_string(),
                failing_navigations: 0,
            }),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The first `count` navigations fail
    pub fn failing_navigations(self, count: u32) -> Self {
        self.state.lock().unwrap().failing_navigations = count;
        self
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.log.lock().unwrap().clone()
    }

    pub fn scrolls(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, SimEvent::Scroll))
            .count()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SimEvent::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: SimEvent) {
        self.log.lock().unwrap().push(event);
    }

    fn advance(&self) {
        self.state.lock().unwrap().position += 1;
        self.record(SimEvent::Scroll);
    }
}

#[async_trait]
impl PageHandle for SimPage {
    type Element = SimElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            if state.failing_navigations > 0 {
                state.failing_navigations -= 1;
                return Err(TrawlerError::Browser("net::ERR_CONNECTION_RESET".into()));
            }
            state.url = url.to_string();
            state.position = 0;
        }
        self.record(SimEvent::Navigate(url.to_string()));
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn execute_script(&self, script: &str) -> Result<Value> {
        if script == SCROLL_TO_BOTTOM || script.starts_with("window.scrollBy") {
            self.advance();
            return Ok(json!(true));
        }
        if script == VIEWPORT_HEIGHT {
            return Ok(json!(800));
        }
        Err(TrawlerError::Script(format!("unsupported script: {}", script)))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<SimElement>> {
        if selector != POST_SELECTOR {
            return Ok(Vec::new());
        }
        let position = self.state.lock().unwrap().position;
        self.record(SimEvent::Query { position });
        let index = position.min(self.snapshots.len().saturating_sub(1));
        Ok(self
            .snapshots
            .get(index)
            .map(|snapshot| snapshot.iter().map(|e| e.attach(&self.log)).collect())
            .unwrap_or_default())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.record(SimEvent::PageShot(path.to_path_buf()));
        Ok(())
    }
}

/// Posts `ids` in order as a single snapshot
pub fn posts(ids: &[&str]) -> Vec<SimElement> {
    ids.iter().map(|id| SimElement::post(id)).collect()
}
