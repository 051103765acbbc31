//! Result files: text or JSON listings of collected posts, analysis
//! reports and screenshot summaries, grouped by day.

mod formatter;

pub use formatter::Formatter;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::app::TrawlerError;

pub const MAX_FILENAME_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = TrawlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(OutputFormat::Txt),
            "json" => Ok(OutputFormat::Json),
            other => Err(TrawlerError::Config(format!(
                "unknown output format: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory for result files (default: trawler-output)
    pub output_dir: PathBuf,

    /// Default result format (default: txt)
    pub format: OutputFormat,

    /// Write a screenshot summary next to the images (default: true)
    pub write_summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("trawler-output"),
            format: OutputFormat::Txt,
            write_summary: true,
        }
    }
}

/// Make `name` safe to use as a file name.
///
/// Path separators and other reserved characters become `_`, as does
/// whitespace; runs of `_` collapse and the result is limited to
/// `MAX_FILENAME_LENGTH - 4` bytes so prefixes and suffixes still fit
/// under the 255-byte file name limit.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' | '(' | ')')
            || c.is_whitespace()
            || c.is_control()
        {
            '_'
        } else {
            c
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches('_');
    let limit = MAX_FILENAME_LENGTH - 4;
    if trimmed.len() > limit {
        let mut end = limit - 3;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    } else if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// File locations for one run: `<output_dir>/<YYYY-MM-DD>/<timestamp>_<label>*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    day_dir: PathBuf,
    stem: String,
}

impl RunPaths {
    pub fn new(output_dir: &Path, label: &str, now: DateTime<Local>) -> Self {
        Self {
            day_dir: output_dir.join(now.format("%Y-%m-%d").to_string()),
            stem: format!(
                "{}_{}",
                now.format("%Y%m%d_%H%M%S"),
                sanitize_filename(label)
            ),
        }
    }

    pub fn day_dir(&self) -> &Path {
        &self.day_dir
    }

    pub fn result_file(&self, format: OutputFormat, suffix: &str) -> PathBuf {
        self.day_dir
            .join(format!("{}{}.{}", self.stem, suffix, format.extension()))
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.day_dir.join(format!("{}_screenshots", self.stem))
    }
}
