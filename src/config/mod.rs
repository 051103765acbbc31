//! Configuration management for trawler.
//!
//! Configuration is read from `~/.config/trawler/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use crate::browser::BrowserConfig;
use crate::output::OutputConfig;
use crate::pipeline::AnalysisConfig;
use crate::scraper::{PacingPolicy, ScraperConfig, SelectorConfig};
use crate::store::ArchiveConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub scraper: ScraperConfig,
    pub pacing: PacingPolicy,
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
    pub archive: ArchiveConfig,
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/trawler/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("trawler").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# trawler configuration
#
# Every key is optional; anything left out falls back to its default.

[browser]
# Attach to a Chrome started with --remote-debugging-port=9222.
# Set to "" to launch a fresh browser instead.
debug_url = "http://localhost:9222"

# Launch mode only: run without a visible window
headless = true

# How long to wait for the debug endpoint to answer (milliseconds)
probe_timeout_ms = 1000

[scraper]
# Site root that @handles and searches resolve against
base_url = "https://x.com/"

# Drop sponsored posts instead of collecting them
exclude_promoted = true

# none, individual, smart_batch or full_batch
capture_mode = "smart_batch"

# Records to collect when no count is given
default_count = 20

# Viewport captures per run in full_batch mode
max_viewport_shots = 10
max_thread_viewport_shots = 15

[pacing]
# Wait after each scroll for new posts to render (milliseconds)
scroll_delay_ms = 800

# Wait after navigation before the first read (milliseconds)
navigation_settle_ms = 2500

# Navigation retries and per-attempt timeout
max_retries = 2
navigation_timeout_secs = 15

# Give up after this many scrolls in a row without a new post
stagnation_threshold = 3

# Scroll cap is ceil(count * scroll_multiplier), clamped to [scroll_floor, scroll_ceiling]
scroll_multiplier = 2.0
scroll_floor = 10
scroll_ceiling = 30

# Scroll cap when collecting thread replies
reply_scroll_cap = 15

[selectors]
# One element per rendered post
post_container = "article[data-testid=\"tweet\"]"

# Whole lines of post text that mark sponsored content
promotion_markers = ["プロモーション", "Promoted", "広告", "Ad"]

[output]
# Where result files and screenshots are written
output_dir = "trawler-output"

# txt or json
format = "txt"

# Write a run summary next to the results
write_summary = true

[archive]
# Keep every run in a local SQLite database
enabled = true

[analysis]
# Posts included in the default analysis prompt
max_prompt_records = 10
max_retries = 2
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CaptureMode;
    use crate::output::OutputFormat;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        let defaults = Config::default();
        assert_eq!(config.pacing, defaults.pacing);
        assert_eq!(config.selectors, defaults.selectors);
        assert_eq!(config.browser.debug_url, defaults.browser.debug_url);
        assert_eq!(config.scraper.capture_mode, CaptureMode::SmartBatch);
        assert_eq!(config.output.format, OutputFormat::Txt);
        assert!(config.archive.enabled);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[pacing]
scroll_delay_ms = 100

[scraper]
exclude_promoted = false
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.pacing.scroll_delay_ms, 100);
        assert!(!config.scraper.exclude_promoted);
        // Default values
        assert_eq!(config.pacing.stagnation_threshold, 3);
        assert_eq!(config.scraper.default_count, 20);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.pacing, PacingPolicy::default());
        assert!(config.browser.headless);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.scraper.default_count, 20);

        // Second load parses the file that was written
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.pacing, config.pacing);
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[pacing]\nscroll_delay_ms = \"slow\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
