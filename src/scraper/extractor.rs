use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::app::Result;
use crate::browser::ElementHandle;
use crate::domain::{canonical_permalink, Counter, Engagement, PostRecord};
use crate::scraper::count::{is_count_like, parse_count};
use crate::scraper::selectors::{CounterSelectors, SelectorConfig};

static COUNT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?[KkMm万]?").expect("static regex"));

/// Collapse runs of whitespace (including newlines) into single spaces
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// RFC 3339 in UTC when the value parses, otherwise the trimmed raw value
pub fn normalize_timestamp(raw: &str) -> String {
    let raw = raw.trim();
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        Err(_) => raw.to_string(),
    }
}

/// Find the count an accessibility label attaches to one of `phrases`.
///
/// `"12 replies, 3 reposts, 40 likes"` with `["like"]` gives 40.
pub fn label_count(label: &str, phrases: &[String]) -> Option<u64> {
    COUNT_TOKEN.find_iter(label).find_map(|m| {
        let rest = label[m.end()..].trim_start();
        let rest = rest.strip_prefix("件の").unwrap_or(rest).to_lowercase();
        phrases
            .iter()
            .any(|p| rest.starts_with(&p.to_lowercase()))
            .then(|| parse_count(m.as_str()))
    })
}

/// Reads a [`PostRecord`] out of one rendered post.
///
/// Every field has its own ordered selector chain and fails on its own: a
/// missing counter does not cost the body text.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    selectors: SelectorConfig,
    base: Url,
}

impl RecordExtractor {
    pub fn new(selectors: SelectorConfig, base: Url) -> Self {
        Self { selectors, base }
    }

    pub fn selectors(&self) -> &SelectorConfig {
        &self.selectors
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Canonical permalink of the post, or empty when none is readable
    pub async fn identity_key<E: ElementHandle>(&self, element: &E) -> String {
        for selector in &self.selectors.permalink {
            let links = match element.find_elements(selector).await {
                Ok(links) => links,
                Err(e) => {
                    debug!("Permalink query {} failed: {}", selector, e);
                    continue;
                }
            };
            for link in links {
                if let Ok(Some(href)) = link.attribute("href").await {
                    if let Some(key) = canonical_permalink(&href, &self.base) {
                        return key;
                    }
                }
            }
        }
        String::new()
    }

    /// Extract a record, or `None` when nothing identifying could be read
    pub async fn extract<E: ElementHandle>(
        &self,
        element: &E,
        capture_index: usize,
    ) -> Option<PostRecord> {
        let mut record = PostRecord::new(capture_index);
        record.identity_key = self.identity_key(element).await;
        record.body_text = self.first_text(element, &self.selectors.body_text).await;
        record.author = self.first_text(element, &self.selectors.author).await;

        if record.identity_key.is_empty() && record.body_text.is_empty() && record.author.is_empty()
        {
            return None;
        }

        record.posted_at = self
            .first_attribute(element, &self.selectors.timestamp, "datetime")
            .await
            .map(|raw| normalize_timestamp(&raw))
            .unwrap_or_default();
        record.engagement = self.engagement(element).await;
        record.is_promoted = self.is_promoted(element).await;
        Some(record)
    }

    pub async fn engagement<E: ElementHandle>(&self, element: &E) -> Engagement {
        let mut engagement = Engagement::default();
        for counter in Counter::ALL {
            let value = self
                .read_counter(element, self.selectors.counter(counter))
                .await;
            engagement.set(counter, value);
        }
        engagement
    }

    /// Sponsored-content check. Errors count as not promoted.
    pub async fn is_promoted<E: ElementHandle>(&self, element: &E) -> bool {
        match self.check_promoted(element).await {
            Ok(promoted) => promoted,
            Err(e) => {
                debug!("Promotion check failed, treating as organic: {}", e);
                false
            }
        }
    }

    async fn check_promoted<E: ElementHandle>(&self, element: &E) -> Result<bool> {
        match element.text().await {
            Ok(text) => {
                let marked = text.lines().map(str::trim).any(|line| {
                    self.selectors
                        .promotion_markers
                        .iter()
                        .any(|marker| line == marker)
                });
                if marked {
                    return Ok(true);
                }
            }
            // The structural selectors below do not need the text
            Err(e) => debug!("Promotion marker check skipped: {}", e),
        }

        for selector in &self.selectors.promotion_selectors {
            if !element.find_elements(selector).await?.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn read_counter<E: ElementHandle>(&self, element: &E, chain: &CounterSelectors) -> u64 {
        for selector in &chain.label {
            let Ok(candidates) = element.find_elements(selector).await else {
                continue;
            };
            for candidate in candidates {
                if let Ok(Some(label)) = candidate.attribute("aria-label").await {
                    if let Some(count) = label_count(&label, &chain.phrases) {
                        return count;
                    }
                }
            }
        }

        for selector in &chain.text {
            let Ok(candidates) = element.find_elements(selector).await else {
                continue;
            };
            for candidate in candidates {
                if let Ok(text) = candidate.text().await {
                    if is_count_like(&text) {
                        return parse_count(&text);
                    }
                }
            }
        }
        0
    }

    /// Text of the first visible, non-empty match across the chain
    async fn first_text<E: ElementHandle>(&self, element: &E, chain: &[String]) -> String {
        for selector in chain {
            let candidates = match element.find_elements(selector).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    debug!("Query {} failed: {}", selector, e);
                    continue;
                }
            };
            for candidate in candidates {
                if !candidate.is_displayed().await.unwrap_or(false) {
                    continue;
                }
                if let Ok(text) = candidate.text().await {
                    let text = clean_text(&text);
                    if !text.is_empty() {
                        return text;
                    }
                }
            }
        }
        String::new()
    }

    async fn first_attribute<E: ElementHandle>(
        &self,
        element: &E,
        chain: &[String],
        attribute: &str,
    ) -> Option<String> {
        for selector in chain {
            let Ok(candidates) = element.find_elements(selector).await else {
                continue;
            };
            for candidate in candidates {
                if let Ok(Some(value)) = candidate.attribute(attribute).await {
                    if !value.trim().is_empty() {
                        return Some(value);
                    }
                }
            }
        }
        None
    }
}
