//! Command-line interface for loadclient
//!
//! # Usage Examples
//!
//! ```bash
//! # Generate 100 lines/s on stdout until interrupted
//! loadclient generate --log-lines-per-sec 100
//!
//! # Push to Elasticsearch, 8 workers, 1000 lines/s each, 1M lines per worker
//! loadclient generate --threads 8 --log-lines-per-sec 1000 --total-log-lines 1000000 \
//!   --destination elasticsearch --destination-url http://elasticsearch:9200
//!
//! # Replay queries from a file against Elasticsearch
//! loadclient query --destination elasticsearch --destination-url http://elasticsearch:9200 \
//!   --query-file queries.yaml --queries-per-minute 60
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides `--log-level`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use loadclient::{GenerateArgs, QueryArgs};
use loadclient_runner::{run_generate, run_query};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loadclient")]
#[command(about = "A synthetic log load generator and query driver for log ingestion backends")]
#[command(version, long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", env = "LOADCLIENT_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate log lines and send them to a destination
    Generate(GenerateArgs),

    /// Replay queries against a log backend
    Query(QueryArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cli.log_level)
            .with_context(|| format!("Invalid --log-level '{}'", cli.log_level))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    let report = match cli.command {
        Commands::Generate(args) => {
            let spec = args.into_spec()?;
            run_generate(spec, cancel).await.context("Generate run failed")?
        }
        Commands::Query(args) => {
            let spec = args.into_spec()?;
            run_query(spec, cancel).await.context("Query run failed")?
        }
    };

    tracing::info!("{}", report.summary().trim_end());
    Ok(())
}

/// Cancel `token` on Ctrl-C or SIGTERM.
async fn shutdown_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, stopping workers"),
        _ = terminate => tracing::info!("Received SIGTERM, stopping workers"),
    }
    token.cancel();
}
