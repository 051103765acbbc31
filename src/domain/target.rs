use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::{Result, TrawlerError};

pub const MAX_QUERY_LENGTH: usize = 500;

static STATUS_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status/(\d+)").expect("static regex"));

/// Where an incremental collection starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Single-subject timeline, from an `@handle`
    Timeline { handle: String },
    /// Free-text query routed to the latest-first search view
    Search { query: String },
}

impl Origin {
    pub fn entry_url(&self, base: &Url) -> Result<String> {
        match self {
            Origin::Timeline { handle } => Ok(base.join(handle)?.to_string()),
            Origin::Search { query } => {
                let mut url = base.join("search")?;
                url.query_pairs_mut()
                    .append_pair("q", query)
                    .append_pair("src", "typed_query")
                    .append_pair("f", "live");
                Ok(url.to_string())
            }
        }
    }

    /// Human-facing label, also used to name output files
    pub fn label(&self) -> String {
        match self {
            Origin::Timeline { handle } => format!("@{}", handle),
            Origin::Search { query } => query.clone(),
        }
    }
}

/// A parsed user request: either a listing to collect or a thread to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Collection(Origin),
    Thread { parent_url: String },
}

impl Target {
    /// Route raw input: post permalinks become threads, `@handle` a timeline,
    /// anything else a search query.
    pub fn parse(input: &str, base: &Url) -> Result<Self> {
        validate_query(input)?;
        let input = input.trim();

        if is_post_url(input, base) {
            let parent_url = canonical_permalink(input, base).unwrap_or_else(|| input.to_string());
            return Ok(Target::Thread { parent_url });
        }

        if let Some(handle) = input.strip_prefix('@') {
            let handle = handle.trim();
            if handle.is_empty() || handle.contains(char::is_whitespace) {
                return Err(TrawlerError::InvalidQuery(format!(
                    "not a valid handle: {}",
                    input
                )));
            }
            return Ok(Target::Collection(Origin::Timeline {
                handle: handle.to_string(),
            }));
        }

        Ok(Target::Collection(Origin::Search {
            query: input.to_string(),
        }))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Target::Collection(Origin::Timeline { .. }) => "timeline",
            Target::Collection(Origin::Search { .. }) => "search",
            Target::Thread { .. } => "thread",
        }
    }

    pub fn label(&self) -> String {
        match self {
            Target::Collection(origin) => origin.label(),
            Target::Thread { parent_url } => match post_id(parent_url) {
                Some(id) => format!("replies_{}", id),
                None => "replies_unknown".to_string(),
            },
        }
    }
}

pub fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(TrawlerError::InvalidQuery("query is empty".into()));
    }
    if query.chars().count() > MAX_QUERY_LENGTH {
        return Err(TrawlerError::InvalidQuery(format!(
            "query is longer than {} characters",
            MAX_QUERY_LENGTH
        )));
    }
    Ok(())
}

fn is_known_host(host: &str, base: &Url) -> bool {
    let host = host.trim_start_matches("www.").trim_start_matches("mobile.");
    let base_host = base
        .host_str()
        .unwrap_or_default()
        .trim_start_matches("www.");
    host == base_host || host == "x.com" || host == "twitter.com"
}

/// Whether `input` is an absolute permalink to a single post
pub fn is_post_url(input: &str, base: &Url) -> bool {
    let Ok(url) = Url::parse(input) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    is_known_host(host, base) && STATUS_PATH.is_match(url.path())
}

/// Numeric post id from a permalink
pub fn post_id(url: &str) -> Option<String> {
    STATUS_PATH
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Reduce an href (absolute or relative) to `<scheme>://<host>/<user>/status/<id>`.
///
/// Trailing segments such as `/photo/1` or `/analytics`, the query and the
/// fragment are dropped so every rendering of one post maps to one key.
pub fn canonical_permalink(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let url = base.join(href).ok()?;
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    let pos = segments.iter().position(|s| *s == "status")?;
    if pos == 0 {
        return None;
    }
    let id = segments.get(pos + 1)?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(format!(
        "{}://{}/{}/status/{}",
        url.scheme(),
        url.host_str()?,
        segments[pos - 1],
        id
    ))
}

/// How screenshots are taken alongside collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Data only
    None,
    /// One element screenshot per accepted record
    Individual,
    /// One element screenshot per accepted record, taken as it is discovered
    #[default]
    SmartBatch,
    /// Viewport slices at fixed scroll offsets
    FullBatch,
}

impl CaptureMode {
    pub fn captures_per_item(self) -> bool {
        matches!(self, CaptureMode::Individual | CaptureMode::SmartBatch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaptureMode::None => "none",
            CaptureMode::Individual => "individual",
            CaptureMode::SmartBatch => "smart_batch",
            CaptureMode::FullBatch => "full_batch",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "none" | "off" => Ok(CaptureMode::None),
            "individual" => Ok(CaptureMode::Individual),
            "smart_batch" | "smart" => Ok(CaptureMode::SmartBatch),
            "full_batch" | "full" => Ok(CaptureMode::FullBatch),
            other => Err(format!(
                "Unknown capture mode: {}. Use none, individual, smart_batch or full_batch",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://x.com/").unwrap()
    }

    #[test]
    fn test_parse_search_query() {
        let target = Target::parse("rust lang", &base()).unwrap();
        assert_eq!(
            target,
            Target::Collection(Origin::Search {
                query: "rust lang".into()
            })
        );
    }

    #[test]
    fn test_parse_timeline_handle() {
        let target = Target::parse("@rustlang", &base()).unwrap();
        assert_eq!(
            target,
            Target::Collection(Origin::Timeline {
                handle: "rustlang".into()
            })
        );
        assert_eq!(target.label(), "@rustlang");
    }

    #[test]
    fn test_parse_thread_url() {
        let target =
            Target::parse("https://twitter.com/alice/status/12345?s=20", &base()).unwrap();
        assert_eq!(
            target,
            Target::Thread {
                parent_url: "https://twitter.com/alice/status/12345".into()
            }
        );
        assert_eq!(target.label(), "replies_12345");
    }

    #[test]
    fn test_parse_rejects_empty_and_long() {
        assert!(Target::parse("   ", &base()).is_err());
        assert!(Target::parse(&"a".repeat(501), &base()).is_err());
        assert!(Target::parse("@", &base()).is_err());
    }

    #[test]
    fn test_search_entry_url_encodes_query() {
        let origin = Origin::Search {
            query: "café #rust".into(),
        };
        let url = origin.entry_url(&base()).unwrap();
        assert!(url.starts_with("https://x.com/search?q=caf%C3%A9+%23rust"));
        assert!(url.ends_with("&src=typed_query&f=live"));
    }

    #[test]
    fn test_timeline_entry_url() {
        let origin = Origin::Timeline {
            handle: "alice".into(),
        };
        assert_eq!(origin.entry_url(&base()).unwrap(), "https://x.com/alice");
    }

    #[test]
    fn test_canonical_permalink_variants() {
        let expected = Some("https://x.com/alice/status/42".to_string());
        assert_eq!(canonical_permalink("/alice/status/42", &base()), expected);
        assert_eq!(
            canonical_permalink("/alice/status/42/photo/1", &base()),
            expected
        );
        assert_eq!(
            canonical_permalink("https://x.com/alice/status/42/analytics", &base()),
            expected
        );
        assert_eq!(
            canonical_permalink("https://x.com/alice/status/42?ref=abc#top", &base()),
            expected
        );
    }

    #[test]
    fn test_canonical_permalink_rejects_non_posts() {
        assert_eq!(canonical_permalink("", &base()), None);
        assert_eq!(canonical_permalink("/alice", &base()), None);
        assert_eq!(canonical_permalink("/status/42", &base()), None);
        assert_eq!(canonical_permalink("/alice/status/abc", &base()), None);
    }

    #[test]
    fn test_is_post_url() {
        assert!(is_post_url("https://x.com/a/status/1", &base()));
        assert!(is_post_url("https://mobile.twitter.com/a/status/1", &base()));
        assert!(!is_post_url("https://example.com/a/status/1", &base()));
        assert!(!is_post_url("/a/status/1", &base()));
        assert!(!is_post_url("https://x.com/a", &base()));
    }

    #[test]
    fn test_capture_mode_from_str() {
        assert_eq!("smart-batch".parse::<CaptureMode>(), Ok(CaptureMode::SmartBatch));
        assert_eq!("FULL_BATCH".parse::<CaptureMode>(), Ok(CaptureMode::FullBatch));
        assert_eq!("individual".parse::<CaptureMode>(), Ok(CaptureMode::Individual));
        assert!("sometimes".parse::<CaptureMode>().is_err());
    }
}
