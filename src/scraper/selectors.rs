use serde::{Deserialize, Serialize};

use crate::domain::Counter;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Where one engagement counter can be read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterSelectors {
    /// Elements whose `aria-label` carries the count ("12 replies")
    pub label: Vec<String>,
    /// Words that follow the count in those labels, matched case-insensitively
    pub phrases: Vec<String>,
    /// Elements whose rendered text is the bare count ("1.2K")
    pub text: Vec<String>,
}

/// CSS selector chains, tried in order until one yields a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One element per rendered post
    pub post_container: String,
    pub body_text: Vec<String>,
    pub permalink: Vec<String>,
    pub author: Vec<String>,
    pub timestamp: Vec<String>,
    pub replies: CounterSelectors,
    pub shares: CounterSelectors,
    pub likes: CounterSelectors,
    pub views: CounterSelectors,
    /// Whole lines of post text that mark sponsored content
    pub promotion_markers: Vec<String>,
    /// Structural markers of sponsored content
    pub promotion_selectors: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            post_container: r#"article[data-testid="tweet"]"#.to_string(),
            body_text: strings(&[r#"[data-testid="tweetText"]"#, "[lang] span"]),
            permalink: strings(&[r#"a[href*="/status/"]"#]),
            author: strings(&[
                r#"[data-testid="User-Name"] a"#,
                r#"div[data-testid="User-Name"] span"#,
            ]),
            timestamp: strings(&["time"]),
            replies: CounterSelectors {
                label: strings(&[r#"[data-testid="reply"]"#, r#"[role="group"]"#]),
                phrases: strings(&["repl", "返信"]),
                text: strings(&[r#"[data-testid="reply"] span"#]),
            },
            shares: CounterSelectors {
                label: strings(&[
                    r#"[data-testid="retweet"]"#,
                    r#"[data-testid="unretweet"]"#,
                    r#"[role="group"]"#,
                ]),
                phrases: strings(&["repost", "retweet", "リポスト"]),
                text: strings(&[
                    r#"[data-testid="retweet"] span"#,
                    r#"[data-testid="unretweet"] span"#,
                ]),
            },
            likes: CounterSelectors {
                label: strings(&[
                    r#"[data-testid="like"]"#,
                    r#"[data-testid="unlike"]"#,
                    r#"[role="group"]"#,
                ]),
                phrases: strings(&["like", "いいね"]),
                text: strings(&[
                    r#"[data-testid="like"] span"#,
                    r#"[data-testid="unlike"] span"#,
                ]),
            },
            views: CounterSelectors {
                label: strings(&[r#"a[href*="/analytics"]"#, r#"[role="group"]"#]),
                phrases: strings(&["view", "表示"]),
                text: strings(&[r#"a[href*="/analytics"] span"#]),
            },
            promotion_markers: strings(&["プロモーション", "Promoted", "広告", "Ad"]),
            promotion_selectors: strings(&[r#"[data-testid="placementTracking"]"#]),
        }
    }
}

impl SelectorConfig {
    pub fn counter(&self, counter: Counter) -> &CounterSelectors {
        match counter {
            Counter::Replies => &self.replies,
            Counter::Shares => &self.shares,
            Counter::Likes => &self.likes,
            Counter::Views => &self.views,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_counter() {
        let selectors = SelectorConfig::default();
        for counter in Counter::ALL {
            let chain = selectors.counter(counter);
            assert!(!chain.label.is_empty(), "{}", counter.name());
            assert!(!chain.phrases.is_empty(), "{}", counter.name());
            assert!(!chain.text.is_empty(), "{}", counter.name());
        }
    }

    #[test]
    fn test_override_keeps_other_chains() {
        let selectors: SelectorConfig =
            toml::from_str(r#"post_container = "div.post""#).unwrap();
        assert_eq!(selectors.post_container, "div.post");
        assert_eq!(selectors.timestamp, vec!["time".to_string()]);
    }
}
