use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde_json::json;
use tracing::info;

use crate::app::Result;
use crate::domain::{PostRecord, ScreenshotArtifact};
use crate::output::{OutputFormat, RunPaths};
use crate::scraper::RunReport;

const RULE_WIDTH: usize = 50;

/// Writes the files of one run under its dated directory
pub struct Formatter {
    paths: RunPaths,
    label: String,
    format: OutputFormat,
    created_at: DateTime<Local>,
}

impl Formatter {
    pub fn new(output_dir: &Path, label: &str, format: OutputFormat) -> Self {
        Self::at(output_dir, label, format, Local::now())
    }

    pub fn at(output_dir: &Path, label: &str, format: OutputFormat, now: DateTime<Local>) -> Self {
        Self {
            paths: RunPaths::new(output_dir, label, now),
            label: label.to_string(),
            format,
            created_at: now,
        }
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.paths.screenshot_dir()
    }

    pub fn save_records(&self, records: &[PostRecord], report: Option<&RunReport>) -> Result<PathBuf> {
        let path = self.paths.result_file(self.format, "");
        let content = match self.format {
            OutputFormat::Txt => self.render_txt(records, None),
            OutputFormat::Json => self.render_json(records, None, report)?,
        };
        self.write(&path, &content)?;
        info!("Saved {} records to {}", records.len(), path.display());
        Ok(path)
    }

    pub fn save_with_analysis(&self, records: &[PostRecord], analysis: &str) -> Result<PathBuf> {
        let path = self.paths.result_file(self.format, "_analysis");
        let content = match self.format {
            OutputFormat::Txt => self.render_txt(records, Some(analysis)),
            OutputFormat::Json => self.render_json(records, Some(analysis), None)?,
        };
        self.write(&path, &content)?;
        info!("Saved analysis to {}", path.display());
        Ok(path)
    }

    /// Index of screenshots and the records they show, inside the screenshot dir
    pub fn write_summary(
        &self,
        records: &[PostRecord],
        artifacts: &[ScreenshotArtifact],
    ) -> Result<PathBuf> {
        let path = self.paths.screenshot_dir().join("screenshot_summary.txt");
        let rule = "=".repeat(RULE_WIDTH);

        let mut out = String::new();
        out.push_str(&format!("Query: {}\n", self.label));
        out.push_str(&format!("Captured at: {}\n", self.timestamp()));
        out.push_str(&format!("Posts: {}\n", records.len()));
        out.push_str(&format!("Screenshots: {}\n", artifacts.len()));
        out.push_str(&format!("{}\n\n", rule));

        out.push_str("Screenshots:\n");
        for (i, artifact) in artifacts.iter().enumerate() {
            let source = artifact
                .source_capture_index
                .map(|idx| format!(" (post {})", idx))
                .unwrap_or_default();
            out.push_str(&format!("{:3}. {}{}\n", i + 1, artifact.file_name(), source));
        }

        out.push_str(&format!("\n{}\n", rule));
        out.push_str("Posts:\n");
        for record in records {
            let preview: String = record.body_text.chars().take(100).collect();
            out.push_str(&format!(
                "\n{:3}. {} - {}\n",
                record.capture_index,
                record.display_author(),
                record.posted_at
            ));
            out.push_str(&format!("     URL: {}\n", record.identity_key));
            out.push_str(&format!("     Text: {}\n", preview));
            out.push_str(&format!(
                "     Likes {} | Reposts {}\n",
                record.engagement.like_count, record.engagement.share_count
            ));
        }

        self.write(&path, &out)?;
        Ok(path)
    }

    fn timestamp(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn render_txt(&self, records: &[PostRecord], analysis: Option<&str>) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();
        out.push_str(&format!("Query: {}\n", self.label));
        out.push_str(&format!("Collected at: {}\n", self.timestamp()));
        out.push_str(&format!("Count: {}\n", records.len()));
        out.push_str(&format!("{}\n\n", rule));

        if let Some(analysis) = analysis {
            out.push_str("[Analysis]\n");
            out.push_str(analysis.trim_end());
            out.push('\n');
            out.push_str(&format!("{}\n\n", rule));
            out.push_str("[Posts]\n");
        }

        for record in records {
            out.push_str(&render_record(record));
            out.push('\n');
        }
        out
    }

    fn render_json(
        &self,
        records: &[PostRecord],
        analysis: Option<&str>,
        report: Option<&RunReport>,
    ) -> Result<String> {
        let mut document = json!({
            "scrape_info": {
                "query": self.label,
                "timestamp": self.created_at.to_rfc3339(),
                "count": records.len(),
            },
            "posts": records,
        });
        if let Some(analysis) = analysis {
            document["analysis"] = json!(analysis);
        }
        if let Some(report) = report {
            document["report"] = serde_json::to_value(report)?;
        }
        Ok(serde_json::to_string_pretty(&document)?)
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}

/// One post as a plain-text block
pub fn render_record(record: &PostRecord) -> String {
    let e = &record.engagement;
    format!(
        "Time: {}\nURL: {}\n{}\n{}\nReplies: {} | Reposts: {} | Likes: {} | Views: {}\n",
        record.posted_at,
        record.identity_key,
        record.display_author(),
        record.body_text,
        e.reply_count,
        e.share_count,
        e.like_count,
        e.view_count
    )
}
