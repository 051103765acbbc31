use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How to reach the browser the collectors drive
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Attach to an already-running Chrome started with
    /// `--remote-debugging-port`. An empty string launches a browser instead.
    pub debug_url: Option<String>,

    /// Launch mode only: run without a visible window (default: true)
    pub headless: bool,

    /// Timeout for probing the debug endpoint in milliseconds (default: 1000)
    pub probe_timeout_ms: u64,

    /// Launch mode only: window size in pixels
    pub window_width: u32,
    pub window_height: u32,

    /// User agent override
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_url: Some("http://localhost:9222".to_string()),
            headless: true,
            probe_timeout_ms: 1000,
            window_width: 1280,
            window_height: 1600,
            user_agent: None,
        }
    }
}

impl BrowserConfig {
    pub fn debug_url(&self) -> Option<&str> {
        self.debug_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_attaches_to_local_debug_port() {
        let config = BrowserConfig::default();
        assert_eq!(config.debug_url.as_deref(), Some("http://localhost:9222"));
        assert!(config.headless);
        assert_eq!(config.probe_timeout_ms, 1000);
    }

    #[test]
    fn test_empty_debug_url_means_launch() {
        let config: BrowserConfig = toml::from_str("debug_url = ''").unwrap();
        assert_eq!(config.debug_url(), None);
        assert_eq!(
            BrowserConfig::default().debug_url(),
            Some("http://localhost:9222")
        );
    }

    #[test]
    fn test_partial_toml() {
        let config: BrowserConfig = toml::from_str("headless = false").unwrap();
        assert!(!config.headless);
        assert_eq!(config.window_width, 1280);
    }
}
