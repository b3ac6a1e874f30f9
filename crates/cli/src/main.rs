// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! dsm - distributed state machinery demo binary

mod steak;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dsm_core::{Backend, MemoryBackend, Registry, UuidIdGen, MACHINE_PREFIX};
use dsm_engine::{Submitter, Worker, WorkerConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dsm", version, about = "Distributed state machinery")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grill steaks: submit sample machines and run workers until all retire
    Grill(GrillArgs),
}

#[derive(clap::Args)]
struct GrillArgs {
    /// Number of steak machines to submit
    #[arg(long, default_value_t = 1)]
    steaks: usize,
    /// Number of in-process workers
    #[arg(long, default_value_t = 1)]
    workers: usize,
    /// Idle wait between discovery passes
    #[arg(long, default_value = "1s", value_parser = humantime_duration)]
    poll_interval: Duration,
}

fn humantime_duration(arg: &str) -> Result<Duration, String> {
    humantime::parse_duration(arg).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Grill(args) => grill(args).await,
    }
}

async fn grill(args: GrillArgs) -> Result<()> {
    let backend = Arc::new(MemoryBackend::new());
    let registry = Arc::new(Registry::new());
    registry.register(steak::MACHINE_TYPE, steak::tick);

    let config = WorkerConfig::default().with_poll_interval(args.poll_interval);

    let submitter = Submitter::new(Arc::clone(&backend), UuidIdGen, config.machine_ttl);
    for _ in 0..args.steaks {
        let id = submitter
            .submit(steak::INITIAL, Vec::new(), steak::MACHINE_TYPE)
            .await?;
        info!(%id, "submitted steak machine");
    }

    let mut handles = Vec::new();
    let mut tasks = Vec::new();
    for _ in 0..args.workers {
        let worker = Worker::new(Arc::clone(&backend), Arc::clone(&registry), config.clone());
        handles.push(worker.shutdown_handle());
        tasks.push(tokio::spawn(async move { worker.run().await }));
    }

    // Ctrl-C stops workers at their next pass boundary
    {
        let handles = handles.clone();
        ctrlc::set_handler(move || {
            for handle in &handles {
                handle.shutdown();
            }
        })?;
    }

    // Wait until every steak retires, then stop the workers
    loop {
        if handles.iter().any(|h| h.is_shutdown()) {
            break;
        }
        let remaining = backend.get_by_prefix(MACHINE_PREFIX).await?;
        if remaining.is_empty() {
            info!("all steaks grilled");
            for handle in &handles {
                handle.shutdown();
            }
            break;
        }
        tokio::time::sleep(args.poll_interval).await;
    }

    for task in tasks {
        task.await?;
    }
    Ok(())
}
