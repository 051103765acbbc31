use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::{Result, TrawlerError};
use crate::domain::CaptureMode;

/// Site and capture settings for collection runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Site root that handles and searches resolve against (default: https://x.com/)
    pub base_url: String,

    /// Drop sponsored posts instead of collecting them (default: true)
    pub exclude_promoted: bool,

    /// Capture mode when none is given on the command line (default: smart_batch)
    pub capture_mode: CaptureMode,

    /// Records to collect when no count is given (default: 20)
    pub default_count: usize,

    /// Viewport captures per listing run (default: 10)
    pub max_viewport_shots: usize,

    /// Viewport captures per thread run (default: 15)
    pub max_thread_viewport_shots: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://x.com/".to_string(),
            exclude_promoted: true,
            capture_mode: CaptureMode::SmartBatch,
            default_count: 20,
            max_viewport_shots: 10,
            max_thread_viewport_shots: 15,
        }
    }
}

impl ScraperConfig {
    pub fn base_url(&self) -> Result<Url> {
        let mut base = self.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let url = Url::parse(&base)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TrawlerError::Config(format!(
                "base_url must be http(s): {}",
                self.base_url
            )));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = ScraperConfig::default();
        assert!(config.exclude_promoted);
        assert_eq!(config.capture_mode, CaptureMode::SmartBatch);
        assert_eq!(config.default_count, 20);
        assert_eq!(config.max_viewport_shots, 10);
        assert_eq!(config.max_thread_viewport_shots, 15);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ScraperConfig {
            base_url: "https://example.com".into(),
            ..Default::default()
        };
        assert_eq!(config.base_url().unwrap().as_str(), "https://example.com/");
    }

    #[test]
    fn test_base_url_rejects_other_schemes() {
        let config = ScraperConfig {
            base_url: "file:///tmp".into(),
            ..Default::default()
        };
        assert!(config.base_url().is_err());
    }

    #[test]
    fn test_capture_mode_from_toml() {
        let config: ScraperConfig = toml::from_str(r#"capture_mode = "full_batch""#).unwrap();
        assert_eq!(config.capture_mode, CaptureMode::FullBatch);
    }
}
