mod cli;
mod commands;
mod config;
mod cycle;
mod executor;
mod paths;
mod report;
mod testutil;
mod watcher;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use report::{ConsoleSink, ReportSink};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins when set; otherwise `-v` flags pick the level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("watchtest={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    let config = config::load(cli.config.as_deref(), &cwd)?;
    match &config.source {
        Some(path) => info!(path = %path.display(), "loaded config"),
        None => info!("using built-in config"),
    }

    let sink: Arc<dyn ReportSink> = Arc::new(ConsoleSink::detect(cli.no_color));

    match Command::resolve(cli.command) {
        Command::Test => commands::cmd_test(&config, sink).await?,
        Command::WatchTest | Command::Dev => {
            commands::cmd_watch(&config, sink, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "could not listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            })
            .await?
        }
    }
    Ok(())
}
