// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleet_stats::backends::local::LocalFetcherFactory;
use fleet_stats::config::{load_and_validate_config, Config, RuntimeBuilder};
use fleet_stats::engine::RunSummary;
use fleet_stats::observability::messages::{
    fetcher::{NextRunScheduled, RunFailed, ShutdownRequested},
    StructuredLog,
};

const DEFAULT_CONFIG: &str = "configs/fleet-stats.yaml";

fn print_summary(summary: &RunSummary, elapsed: std::time::Duration) {
    println!("Completed: {}", summary.completed.join(", "));
    for (fetcher, error) in &summary.failed {
        println!("Failed:    {} ({})", fetcher, error);
    }
    if !summary.skipped.is_empty() {
        println!("Skipped:   {}", summary.skipped.join(", "));
    }
    println!("Run took {:.2?}", elapsed);
}

async fn run_once(config: &Config) -> anyhow::Result<RunSummary> {
    let started = Instant::now();
    let runtime = RuntimeBuilder::from_config(config, |_| LocalFetcherFactory::builtin())?;
    let output = runtime.output.clone();
    let summary = runtime.run().await?;

    print_summary(&summary, started.elapsed());
    println!("Report written to {}", output.display());
    Ok(summary)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: {} [config.yaml|config.toml]", args[0]);
        eprintln!("Default config: {}", DEFAULT_CONFIG);
        eprintln!("Available built-in fetchers: {:?}", LocalFetcherFactory::list_available_implementations());
        return Ok(());
    }
    let config_path = args.get(1).map(String::as_str).unwrap_or(DEFAULT_CONFIG);
    let mut config = load_and_validate_config(config_path)?;

    let Some(server) = config.server.clone() else {
        // failed fetchers are listed in the summary, not in the exit status
        run_once(&config).await?;
        return Ok(());
    };

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ShutdownRequested.log();
            signal.cancel();
        }
    });

    loop {
        if let Err(error) = run_once(&config).await {
            RunFailed { error: &*error }.log();
        }
        // forced refreshes apply to the first run only
        config.fetchers.settle_updates();

        NextRunScheduled {
            interval: server.interval(),
        }
        .log();
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(server.interval()) => {}
        }
    }
    Ok(())
}
