pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::CaptureMode;
use crate::output::OutputFormat;
use crate::scraper::Pace;

#[derive(Parser)]
#[command(name = "trawler")]
#[command(about = "Collect posts, searches and reply threads from a browser session", long_about = None)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect posts for a search query, @handle or post URL
    Collect {
        /// Search query, `@handle` for a timeline, or a post URL for its replies
        input: String,

        /// Number of posts to collect
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Screenshot mode: none, individual, smart_batch, full_batch
        #[arg(short, long)]
        capture: Option<CaptureMode>,

        /// Output format: txt or json
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Keep sponsored posts
        #[arg(long)]
        include_promoted: bool,

        /// Directory for results and screenshots
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Pacing preset replacing the configured waits: fast or thorough
        #[arg(long)]
        pace: Option<Pace>,
    },
    /// List archived runs, or the posts of one run
    History {
        /// Show the posts collected by this run
        run: Option<i64>,
    },
    /// Print the config file location
    ConfigPath,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_flags() {
        let cli = Cli::try_parse_from([
            "trawler", "collect", "@rustlang", "-n", "5", "--capture", "full", "--pace", "fast",
        ])
        .unwrap();
        let Commands::Collect {
            input,
            count,
            capture,
            pace,
            include_promoted,
            ..
        } = cli.command
        else {
            panic!("expected collect");
        };
        assert_eq!(input, "@rustlang");
        assert_eq!(count, Some(5));
        assert_eq!(capture, Some(CaptureMode::FullBatch));
        assert_eq!(pace, Some(Pace::Fast));
        assert!(!include_promoted);

        assert!(Cli::try_parse_from(["trawler", "collect", "x", "--pace", "warp"]).is_err());
    }
}
