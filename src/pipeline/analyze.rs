use std::path::{Path, PathBuf};

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::app::{Result, TrawlerError};
use crate::browser::PageHandle;
use crate::domain::{CaptureMode, Origin, PostRecord};
use crate::output::Formatter;
use crate::pipeline::{
    build_analysis_prompt, build_transcript_prompt, AnalysisConfig, ChatClient, ChatReply,
    Transcriber, Transcript,
};
use crate::scraper::{CaptureCoordinator, CollectionOutcome};

/// Send a prompt, retrying failed or empty replies up to `max_retries` times
pub async fn send_with_retry<C: ChatClient + ?Sized>(
    chat: &C,
    prompt: &str,
    conversation_url: Option<&str>,
    config: &AnalysisConfig,
) -> Result<ChatReply> {
    let attempts = config.max_retries + 1;
    let mut last_error = String::from("no reply");

    for attempt in 1..=attempts {
        if attempt > 1 {
            info!("Retrying chat request ({}/{})", attempt - 1, config.max_retries);
            sleep(config.retry_delay()).await;
        }

        match chat.send(prompt, conversation_url).await {
            Ok(reply) if !reply.text.trim().is_empty() => return Ok(reply),
            Ok(_) => {
                warn!("Chat reply was empty (attempt {})", attempt);
                last_error = "empty reply".to_string();
            }
            Err(e) => {
                warn!("Chat request failed (attempt {}): {}", attempt, e);
                last_error = e.to_string();
            }
        }
    }

    error!("Chat request failed after {} attempts", attempts);
    Err(TrawlerError::Collaborator {
        collaborator: "chat",
        reason: last_error,
    })
}

pub async fn analyze_records<C: ChatClient + ?Sized>(
    chat: &C,
    records: &[PostRecord],
    conversation_url: Option<&str>,
    config: &AnalysisConfig,
) -> Result<ChatReply> {
    let prompt = build_analysis_prompt(
        records,
        config.prompt_template.as_deref(),
        config.max_prompt_records,
    );
    send_with_retry(chat, &prompt, conversation_url, config).await
}

#[derive(Debug, Clone)]
pub struct TranscriptAnalysis {
    pub transcript: Transcript,
    pub reply: ChatReply,
}

/// Transcribe a media file and send the text for analysis
pub async fn analyze_transcript<T, C>(
    transcriber: &T,
    chat: &C,
    media: &Path,
    conversation_url: Option<&str>,
    config: &AnalysisConfig,
) -> Result<TranscriptAnalysis>
where
    T: Transcriber + ?Sized,
    C: ChatClient + ?Sized,
{
    let transcript = transcriber.transcribe(media).await.map_err(|e| {
        TrawlerError::Collaborator {
            collaborator: "transcriber",
            reason: e.to_string(),
        }
    })?;
    info!(
        "Transcribed {} ({} segments)",
        media.display(),
        transcript.segments.len()
    );

    let prompt = build_transcript_prompt(&transcript.text, config.transcript_template.as_deref());
    let reply = send_with_retry(chat, &prompt, conversation_url, config).await?;
    Ok(TranscriptAnalysis { transcript, reply })
}

/// Files and replies produced by [`ScrapeAndAnalyze::run`]
#[derive(Debug)]
pub struct AnalyzedRun {
    pub outcome: CollectionOutcome,
    pub records_file: PathBuf,
    pub analysis: Option<ChatReply>,
    pub analysis_file: Option<PathBuf>,
}

/// Collect, save, analyze and save the analysis.
///
/// A failed analysis leaves the saved records in place and is reported as
/// `analysis: None`.
pub struct ScrapeAndAnalyze<'a, 'c, 'p, P: PageHandle, C: ChatClient + ?Sized> {
    coordinator: &'a CaptureCoordinator<'c, 'p, P>,
    chat: &'a C,
    formatter: &'a Formatter,
    config: &'a AnalysisConfig,
}

impl<'a, 'c, 'p, P: PageHandle, C: ChatClient + ?Sized> ScrapeAndAnalyze<'a, 'c, 'p, P, C> {
    pub fn new(
        coordinator: &'a CaptureCoordinator<'c, 'p, P>,
        chat: &'a C,
        formatter: &'a Formatter,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            coordinator,
            chat,
            formatter,
            config,
        }
    }

    pub async fn run(
        &self,
        origin: &Origin,
        target: usize,
        mode: CaptureMode,
        conversation_url: Option<&str>,
    ) -> Result<AnalyzedRun> {
        let outcome = self
            .coordinator
            .collect_with_capture(origin, target, mode)
            .await?;
        let records_file = self
            .formatter
            .save_records(&outcome.records, Some(&outcome.report))?;

        if outcome.records.is_empty() {
            warn!("Nothing collected for {}, skipping analysis", origin.label());
            return Ok(AnalyzedRun {
                outcome,
                records_file,
                analysis: None,
                analysis_file: None,
            });
        }

        let (analysis, analysis_file) =
            match analyze_records(self.chat, &outcome.records, conversation_url, self.config).await
            {
                Ok(reply) => {
                    let path = self
                        .formatter
                        .save_with_analysis(&outcome.records, &reply.text)?;
                    (Some(reply), Some(path))
                }
                Err(e) => {
                    error!("Analysis failed: {}", e);
                    (None, None)
                }
            };

        Ok(AnalyzedRun {
            outcome,
            records_file,
            analysis,
            analysis_file,
        })
    }
}
