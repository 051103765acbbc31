use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Named engagement counters read off a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub reply_count: u64,
    pub share_count: u64,
    pub like_count: u64,
    pub view_count: u64,
}

impl Engagement {
    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Replies => self.reply_count,
            Counter::Shares => self.share_count,
            Counter::Likes => self.like_count,
            Counter::Views => self.view_count,
        }
    }

    pub fn set(&mut self, counter: Counter, value: u64) {
        match counter {
            Counter::Replies => self.reply_count = value,
            Counter::Shares => self.share_count = value,
            Counter::Likes => self.like_count = value,
            Counter::Views => self.view_count = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Replies,
    Shares,
    Likes,
    Views,
}

impl Counter {
    pub const ALL: [Counter; 4] = [
        Counter::Replies,
        Counter::Shares,
        Counter::Likes,
        Counter::Views,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Counter::Replies => "reply_count",
            Counter::Shares => "share_count",
            Counter::Likes => "like_count",
            Counter::Views => "view_count",
        }
    }
}

/// One scraped post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Canonical permalink, unique within one run
    pub identity_key: String,
    pub author: String,
    pub body_text: String,
    /// RFC 3339 when the source timestamp parsed, otherwise the raw value
    pub posted_at: String,
    pub engagement: Engagement,
    pub is_promoted: bool,
    /// 1-based position in discovery order
    pub capture_index: usize,
}

impl PostRecord {
    pub fn new(capture_index: usize) -> Self {
        Self {
            identity_key: String::new(),
            author: String::new(),
            body_text: String::new(),
            posted_at: String::new(),
            engagement: Engagement::default(),
            is_promoted: false,
            capture_index,
        }
    }

    /// Deterministic archive id derived from the identity key, or from the
    /// content when the post had no readable permalink
    pub fn archive_id(&self) -> String {
        if self.identity_key.is_empty() {
            digest(&[&self.content_key()])
        } else {
            digest(&[&self.identity_key])
        }
    }

    /// Dedup key for posts without a permalink
    pub fn content_key(&self) -> String {
        format!(
            "content:{}",
            digest(&[&self.author, &self.body_text, &self.posted_at])
        )
    }

    pub fn display_author(&self) -> &str {
        if self.author.is_empty() {
            "(unknown)"
        } else {
            &self.author
        }
    }
}

/// Hex SHA-256 of `parts` joined by newlines
pub fn digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parts.join("\n").as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_id_deterministic() {
        let mut a = PostRecord::new(1);
        a.identity_key = "https://x.com/alice/status/1".into();
        let mut b = PostRecord::new(7);
        b.identity_key = "https://x.com/alice/status/1".into();
        assert_eq!(a.archive_id(), b.archive_id());
        assert_eq!(a.archive_id().len(), 64);
    }

    #[test]
    fn test_archive_id_differs_per_key() {
        let mut a = PostRecord::new(1);
        a.identity_key = "https://x.com/alice/status/1".into();
        let mut b = PostRecord::new(1);
        b.identity_key = "https://x.com/alice/status/2".into();
        assert_ne!(a.archive_id(), b.archive_id());
    }

    #[test]
    fn test_linkless_posts_get_distinct_archive_ids() {
        let mut a = PostRecord::new(1);
        a.author = "Alice".into();
        a.body_text = "first".into();
        let mut b = a.clone();
        b.body_text = "second".into();

        assert!(a.content_key().starts_with("content:"));
        assert_ne!(a.archive_id(), b.archive_id());
        assert_eq!(a.archive_id(), a.clone().archive_id());
    }

    #[test]
    fn test_engagement_get_set() {
        let mut engagement = Engagement::default();
        engagement.set(Counter::Likes, 1200);
        engagement.set(Counter::Views, 30000);
        assert_eq!(engagement.get(Counter::Likes), 1200);
        assert_eq!(engagement.get(Counter::Views), 30000);
        assert_eq!(engagement.get(Counter::Replies), 0);
    }

    #[test]
    fn test_display_author_fallback() {
        let record = PostRecord::new(1);
        assert_eq!(record.display_author(), "(unknown)");
    }
}
