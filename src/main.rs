//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `price_tracker` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file with alert channel credentials)
//! - Logger initialization
//! - Registry commands, single or scheduled scrape cycles
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use std::time::Duration;

use price_tracker::app::{
    export_products, import_products, list_products, shutdown_gracefully, spawn_ctrl_c_handler,
};
use price_tracker::initialization::init_logger_with;
use price_tracker::registry::ProductRegistry;
use price_tracker::{run_cycle, Config, Opt};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // Try loading from current directory first, then from the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();
    let config = Config::from(&opt);

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    if let Err(e) = run(&opt, &config).await {
        eprintln!("price_tracker error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(opt: &Opt, config: &Config) -> Result<()> {
    if opt.import_csv.is_some() || opt.export_csv.is_some() || opt.list {
        let registry = ProductRegistry::open(&config.products_path)
            .context("Failed to open product registry")?;
        if let Some(path) = &opt.import_csv {
            import_products(&registry, path)?;
        }
        if let Some(path) = &opt.export_csv {
            export_products(&registry, path)?;
        }
        if opt.list {
            list_products(&registry)?;
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let signal_task = spawn_ctrl_c_handler(cancel.clone());

    if !opt.run_loop {
        let result = run_cycle(config, &cancel).await;
        shutdown_gracefully(cancel, signal_task).await;
        result?;
        return Ok(());
    }

    log::info!(
        "Scheduled mode: one cycle every {} minutes (Ctrl-C to stop)",
        config.interval_minutes
    );
    let mut interval =
        tokio::time::interval(Duration::from_secs(config.interval_minutes.saturating_mul(60)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = cancel.cancelled() => break,
        }
        if let Err(e) = run_cycle(config, &cancel).await {
            log::error!("Cycle failed: {:#}", e);
        }
        if cancel.is_cancelled() {
            break;
        }
    }
    shutdown_gracefully(cancel, signal_task).await;
    log::info!("Tracker stopped");
    Ok(())
}
