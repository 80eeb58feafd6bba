use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use desk_context::{debug_requested, init_logging, ContextEngine, EngineSettings, SettingsStore};

/// Print what the user appears to be doing right now.
#[derive(Debug, Parser)]
#[command(name = "desk-context", version, about)]
struct Cli {
    /// JSON settings file; missing fields keep their defaults.
    #[arg(long, env = "DESK_CONTEXT_SETTINGS")]
    config: Option<PathBuf>,

    /// Emit the report, metrics included, as JSON.
    #[arg(long)]
    json: bool,

    /// Give up on the whole lookup after this many milliseconds.
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Write the screenshot payload here when one was captured.
    #[arg(long)]
    snapshot_out: Option<PathBuf>,

    /// Log at debug level (also enabled by DESK_CONTEXT_DEBUG=1).
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug || debug_requested());

    let settings = match &cli.config {
        Some(path) => SettingsStore::new(path.clone())?.settings(),
        None => EngineSettings::default(),
    };
    log::debug!("using settings: {settings:?}");

    let engine = ContextEngine::native(settings);
    let report = engine
        .resolve_within(Duration::from_millis(cli.timeout_ms))
        .await;

    if let (Some(path), Some(snapshot)) = (&cli.snapshot_out, report.snapshot()) {
        std::fs::write(path, snapshot.as_bytes())
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
        log::info!("Snapshot saved to {} ({} bytes)", path.display(), snapshot.len());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }

    Ok(())
}
