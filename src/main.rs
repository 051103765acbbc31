use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trawler::app::AppContext;
use trawler::cli::{commands, Cli, Commands};
use trawler::config::Config;
use trawler::scraper::{PacingPolicy, ProgressSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "trawler=debug" } else { "trawler=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let mut config = Config::load()?;

    match cli.command {
        Commands::Collect {
            input,
            count,
            capture,
            format,
            include_promoted,
            output_dir,
            pace,
        } => {
            if include_promoted {
                config.scraper.exclude_promoted = false;
            }
            if let Some(dir) = output_dir {
                config.output.output_dir = dir;
            }
            if let Some(pace) = pace {
                config.pacing = PacingPolicy::preset(pace);
            }

            let (tx, rx) = mpsc::channel(64);
            let ctx = AppContext::new(config)?.with_progress(ProgressSink::new(tx));
            commands::cancel_on_interrupt(ctx.cancel.clone());
            let printer = commands::spawn_progress_printer(rx);

            commands::collect(&ctx, &input, count, capture, format).await?;
            drop(ctx);
            printer.await?;
        }
        Commands::History { run } => {
            let ctx = AppContext::new(config)?;
            commands::history(&ctx, run)?;
        }
        Commands::ConfigPath => {
            commands::config_path()?;
        }
    }

    Ok(())
}
