/// Entry point for the uplog endpoint reachability recorder.
///
/// Wires the pieces together: configuration, logging, the SQLite result
/// sink (connected and migrated before any round may run), the long-lived
/// shutdown token driven by SIGINT/SIGTERM, and the round scheduler.
mod config;
mod executor;
mod logger;
mod message;
mod probe;
mod scheduler;
mod sink;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use executor::RoundExecutor;
use probe::Probe;
use scheduler::RoundScheduler;
use sink::SqliteSink;
use std::path::PathBuf;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

/// Define command line arguments using clap
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE", env = "uplog_config")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let _logger = logger::init();

    let cli = Cli::parse();
    tracing::debug!("Config path: {:?}", cli.config);

    if let Err(e) = run(&cli).await {
        // The non-blocking writer may not flush before exit; report fatal
        // startup errors directly on stderr.
        eprintln!("Run failed: {:#}", e);
        std::process::exit(1);
    }
    tracing::info!("Exited without error");
}

async fn run(cli: &Cli) -> Result<()> {
    let conf = Config::load(&cli.config).context("failed to initialize configuration")?;
    tracing::debug!("config: {:?}", conf);

    // Startup precondition: the sink must be open and schema-migrated before
    // the scheduler loop begins. Failure here is fatal.
    let sink = SqliteSink::open(&conf.database.path)
        .context("failed to prepare the result database")?;

    let shutdown = CancellationToken::new();
    watch_shutdown_signals(shutdown.clone());

    let scheduler = RoundScheduler::new(
        conf.endpoints(),
        conf.cadence_floor,
        RoundExecutor::new(Probe::new(conf.probe_timeout)),
        Box::new(sink),
    );

    tracing::info!("Everything is ready, running rounds...");
    scheduler.run(shutdown).await;

    Ok(())
}

// Cancels the token on SIGINT or SIGTERM, whichever arrives first.
fn watch_shutdown_signals(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigint_stream = signal(SignalKind::interrupt()).expect("watch SIGINT failed");
        let mut sigterm_stream = signal(SignalKind::terminate()).expect("watch SIGTERM failed");
        tokio::select! {
            _ = sigint_stream.recv() => {
                tracing::info!("SIGINT received, shutdown initiated...");
            }
            _ = sigterm_stream.recv() => {
                tracing::info!("SIGTERM received, shutdown initiated...");
            }
        }
        shutdown.cancel();
    });
}
