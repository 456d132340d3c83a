#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use anyhow::Context;
use chatsink_config::Config;
use chatsink_core::{ConversationSource, FetchWindow, Recorder, RecorderConfig};
use chatsink_providers::ChatbaseProvider;
use chatsink_store::StorageEngine;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "chatsink")]
#[command(about = "Conversation ingestion into the interaction log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one ingestion pass
    Run {
        /// Window start (RFC 3339); defaults to the trailing window
        #[arg(long)]
        start: Option<String>,

        /// Window end (RFC 3339); defaults to now
        #[arg(long)]
        end: Option<String>,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { start, end } => run(start, end).await?,
        Commands::Version => {
            println!("chatsink {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

async fn run(start: Option<String>, end: Option<String>) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let window = resolve_window(start, end, config.pipeline.window_hours)?;
    info!(
        "Ingestion window: {} to {}",
        window.start().to_rfc3339(),
        window.end().to_rfc3339()
    );

    let mut provider = ChatbaseProvider::new(config.chatbase.api_key, config.chatbase.bot_id)?
        .with_page_size(config.pipeline.page_size);
    if let Some(base_url) = config.chatbase.base_url {
        provider = provider.with_base_url(base_url);
    }

    let engine = StorageEngine::new(&config.database.url).await?;

    let conversations = provider.fetch(&window).await;

    let recorder = Recorder::new(
        engine.clone(),
        engine,
        RecorderConfig {
            interaction_type: config.pipeline.interaction_type,
        },
    );
    let report = recorder.record(conversations).await;

    println!("✅ Processed {} conversations.", report.considered());
    Ok(())
}

fn resolve_window(
    start: Option<String>,
    end: Option<String>,
    window_hours: i64,
) -> anyhow::Result<FetchWindow> {
    if start.is_none() && end.is_none() {
        return Ok(FetchWindow::trailing_hours(window_hours));
    }

    let end = match end {
        Some(raw) => parse_instant(&raw)?,
        None => Utc::now(),
    };
    let start = match start {
        Some(raw) => parse_instant(&raw)?,
        None => end - Duration::hours(window_hours),
    };

    FetchWindow::new(start, end)
}

fn parse_instant(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid RFC 3339 instant: {raw}"))?;
    Ok(parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_bounds_are_validated() {
        let result = resolve_window(
            Some("2026-08-06T10:00:00Z".to_string()),
            Some("2026-08-06T09:00:00Z".to_string()),
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn explicit_start_with_default_end_is_accepted() {
        let window = resolve_window(Some("2026-08-06T09:00:00Z".to_string()), None, 1);
        assert!(window.is_ok());
    }

    #[test]
    fn garbage_instants_are_rejected() {
        assert!(parse_instant("yesterday").is_err());
    }
}
