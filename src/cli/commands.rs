use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::app::{AppContext, Result, TrawlerError};
use crate::config::Config;
use crate::domain::{CaptureMode, Target};
use crate::output::{Formatter, OutputFormat};
use crate::scraper::{CancelFlag, ProgressEvent};
use crate::store::Store;

pub async fn collect(
    ctx: &AppContext,
    input: &str,
    count: Option<usize>,
    capture: Option<CaptureMode>,
    format: Option<OutputFormat>,
) -> Result<()> {
    let config = &ctx.config;
    let target = Target::parse(input, &config.scraper.base_url()?)?;
    let count = count.unwrap_or(config.scraper.default_count);
    let mode = capture.unwrap_or(config.scraper.capture_mode);
    let format = format.unwrap_or(config.output.format);
    let formatter = Formatter::new(&config.output.output_dir, &target.label(), format);

    let session = ctx.open_browser().await?;
    println!(
        "Collecting {} posts for {} ({}, capture: {})",
        count,
        target.label(),
        target.kind(),
        mode
    );

    let started_at = Utc::now();
    let outcome = ctx
        .collect(session.page(), &target, count, mode, &formatter.screenshot_dir())
        .await?;

    let records_file = formatter.save_records(&outcome.records, Some(&outcome.report))?;
    println!("Saved {} posts to {}", outcome.records.len(), records_file.display());

    if !outcome.artifacts.is_empty() {
        println!(
            "Saved {} screenshots to {}",
            outcome.artifacts.len(),
            formatter.screenshot_dir().display()
        );
        if config.output.write_summary {
            formatter.write_summary(&outcome.records, &outcome.artifacts)?;
        }
    }

    match ctx.archive(&target, mode, &outcome, started_at) {
        Ok(Some(run_id)) => println!("Archived as run {}", run_id),
        Ok(None) => {}
        Err(e) => eprintln!("Failed to archive run: {}", e),
    }

    println!("{}", outcome.report.summary());
    Ok(())
}

pub fn history(ctx: &AppContext, run: Option<i64>) -> Result<()> {
    let Some(store) = &ctx.store else {
        println!("Archive is disabled");
        return Ok(());
    };

    let Some(run_id) = run else {
        let runs = store.get_all_runs()?;
        if runs.is_empty() {
            println!("No runs");
            return Ok(());
        }
        for run in runs {
            println!(
                "{:>4}  {}  {:<8} {}  {}/{} {} ({}s)",
                run.id,
                run.started_at.format("%Y-%m-%d %H:%M"),
                run.kind,
                run.label,
                run.accepted,
                run.requested,
                run.status,
                run.duration_secs()
            );
        }
        return Ok(());
    };

    let run = store
        .get_run(run_id)?
        .ok_or_else(|| TrawlerError::Other(format!("No run with id {}", run_id)))?;
    println!("{} ({}, {})", run.label, run.kind, run.status);

    for post in store.get_posts_by_run(run_id)? {
        let shot = store
            .screenshot_for(run_id, post.capture_index)?
            .map(|p| format!("  [{}]", p.display()))
            .unwrap_or_default();
        println!(
            "{:>3}. {}  {}{}",
            post.capture_index,
            post.display_author(),
            post.identity_key,
            shot
        );
    }

    Ok(())
}

pub fn config_path() -> Result<()> {
    let path =
        Config::default_config_path().map_err(|e| TrawlerError::Config(e.to_string()))?;
    println!("{}", path.display());
    Ok(())
}

/// Print progress events until every sender is dropped
pub fn spawn_progress_printer(mut rx: mpsc::Receiver<ProgressEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ProgressEvent::Iteration {
                    iteration,
                    visible,
                    accepted,
                    target,
                } => println!(
                    "  iteration {}: {} visible, {}/{} collected",
                    iteration, visible, accepted, target
                ),
                ProgressEvent::CaptureFailed {
                    capture_index,
                    reason,
                } => eprintln!("  screenshot {} failed: {}", capture_index, reason),
                _ => {}
            }
        }
    })
}

/// Cancel the run on Ctrl-C; the collector stops after its current iteration
pub fn cancel_on_interrupt(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("Interrupted, finishing current iteration...");
            cancel.cancel();
        }
    });
}
