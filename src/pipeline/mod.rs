//! Hand-off of collected posts and media transcripts to external
//! collaborators (a chat model, a speech-to-text engine).
//!
//! ```text
//! CollectionOutcome → Formatter (records file) → prompt → ChatClient → Formatter (analysis file)
//! media file → Transcriber → Transcript → prompt → ChatClient
//! ```

mod analyze;
mod prompt;
mod subtitles;

pub use analyze::{
    analyze_records, analyze_transcript, send_with_retry, AnalyzedRun, ScrapeAndAnalyze,
    TranscriptAnalysis,
};
pub use prompt::{build_analysis_prompt, build_transcript_prompt};
pub use subtitles::{format_srt_timestamp, format_vtt_timestamp, render_srt, render_vtt};

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app::Result;

/// Reply from a chat collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    /// Conversation to continue in, when the collaborator has one
    pub conversation_url: Option<String>,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send(&self, prompt: &str, conversation_url: Option<&str>) -> Result<ChatReply>;
}

/// Timed span of transcribed speech, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<Segment>,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, media: &Path) -> Result<Transcript>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Posts included in the default analysis prompt (default: 10)
    pub max_prompt_records: usize,

    /// Retries after a failed chat request (default: 2)
    pub max_retries: u32,

    /// Wait between chat retries in milliseconds (default: 3000)
    pub retry_delay_ms: u64,

    /// Custom analysis prompt; `{posts}` is replaced by the post listing
    pub prompt_template: Option<String>,

    /// Custom transcript prompt; `{transcription}` is replaced by the text
    pub transcript_template: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_prompt_records: 10,
            max_retries: 2,
            retry_delay_ms: 3000,
            prompt_template: None,
            transcript_template: None,
        }
    }
}

impl AnalysisConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
