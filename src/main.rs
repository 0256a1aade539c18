use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use toast_notify::config;
use toast_notify::memory_backend::MemoryBackend;
use toast_notify::{ErrorReporter, NotificationService};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = config::Cli::parse();

    // Load configuration
    let config = config::load_config(&cli)?;

    let level: LevelFilter = config
        .log_level
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid log level: {}", config.log_level))?;
    SimpleLogger::new()
        .with_level(level)
        .init()
        .context("Failed to initialize logger")?;

    info!("Starting toast-notify");
    info!(
        "Configuration loaded (throttle={}ms, fail_fast={})",
        config.throttle_window_ms, config.fail_fast_on_error
    );

    let reporter = ErrorReporter::from_config(&config);
    let _sweeper = reporter.spawn_sweeper();

    let (hidden_tx, mut hidden_rx) = mpsc::unbounded_channel();
    let backend = MemoryBackend::with_hidden_channel(hidden_tx);
    let mut service = NotificationService::from_config(backend, reporter, &config);

    let default_timeout_ms =
        i64::try_from(config.default_timeout_ms).context("default_timeout_ms out of range")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                // "<kind> <message>"
                let (kind, message) = line.split_once(' ').unwrap_or((line.as_str(), ""));

                match service.show_toast(message, kind, default_timeout_ms) {
                    Ok(Some(handle)) => info!("Toast {} shown", handle.id),
                    Ok(None) => {}
                    Err(e) => {
                        error!("Aborting: {}", e);
                        return Err(e.into());
                    }
                }
            }
            Some(id) = hidden_rx.recv() => {
                service.on_hidden(&id);
            }
        }
    }

    info!("Input closed, waiting for {} toast(s) to hide", service.pending());
    while service.pending() > 0 {
        match hidden_rx.recv().await {
            Some(id) => {
                service.on_hidden(&id);
            }
            None => break,
        }
    }

    Ok(())
}
