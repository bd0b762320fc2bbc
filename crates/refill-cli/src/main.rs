//! `refill-cli` – Refill Controller Command Line Interface
//!
//! Runs a refill service against simulated devices:
//!
//! 1. Loads `~/.refill/config.toml` (or the path given as the first argument),
//!    writing a default file on first run.
//! 2. Validates the service attributes and builds the simulated camera,
//!    classifier and motor named in them.
//! 3. Configures the service (auto-starting the loop if requested) and drops
//!    the user into a REPL that forwards `start` / `stop` commands.
//! 4. Closes the service on `quit`, EOF or Ctrl-C.

mod config;
mod repl;

use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::warn;

use refill_hal::{DeviceRegistry, SimCamera, SimRegistry};
use refill_runtime::{RefillService, init_tracing, validate_config};

#[tokio::main]
async fn main() -> ExitCode {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG filters (default "info"); REFILL_LOG_FORMAT=json for JSON.
    let _guard = init_tracing("refill-controller");

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::config_path);

    let cfg = match config::load_from(&path) {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", path.display().to_string().bold());
            cfg
        }
        Ok(None) => first_run(&path),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let dependencies = match validate_config(&cfg.service) {
        Ok(deps) => deps,
        Err(e) => {
            println!("{}: {}", "Invalid service attributes".red(), e);
            return ExitCode::FAILURE;
        }
    };
    println!("  Dependencies: {}", dependencies.join(", ").dimmed());

    // ── Devices & service ─────────────────────────────────────────────────
    let registry = sim_registry(&cfg);
    let mut service = match RefillService::with_config("refiller", &cfg.service, &registry).await
    {
        Ok(service) => service,
        Err(e) => {
            println!("{}: {}", "Configure failed".red(), e);
            return ExitCode::FAILURE;
        }
    };
    println!(
        "  Loop state: {}\n",
        format!("{:?}", service.state()).yellow()
    );
    println!("  Type {} for a list of commands.\n", "help".bold().cyan());

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ctrlc_tx = shutdown_tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        ctrlc_tx.send_replace(true);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; use `quit` to exit");
    }

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(&service, shutdown_rx).await;

    service.close().await;
    drop(shutdown_tx);
    println!("{}", "  ✓ Refill loop stopped.".green());
    ExitCode::SUCCESS
}

/// Write the default config to `path` and return it with env overrides.
fn first_run(path: &std::path::Path) -> config::Config {
    match config::init_at(path) {
        Ok(cfg) => {
            println!(
                "  {} No config found; defaults written to {}",
                "✓".green().bold(),
                path.display().to_string().bold()
            );
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Error saving config".red(), e);
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

/// Build simulated devices under the names the service attributes ask for.
fn sim_registry(cfg: &config::Config) -> DeviceRegistry {
    let attrs = &cfg.service;
    let sim = &cfg.simulation;
    let name = |value: &Option<String>| value.clone().unwrap_or_default();

    SimRegistry::new()
        .with_camera_driver(SimCamera::failing_every(
            name(&attrs.camera_name),
            sim.capture_failure_every,
        ))
        .with_classifier(name(&attrs.vision_name), sim.label.clone(), sim.confidence)
        .with_motor(name(&attrs.motor_name))
        .build()
}

fn print_banner() {
    println!();
    println!("{}", "  ┌─┐┌─┐┌─┐┬┬  ┬  ".bold().cyan());
    println!("{}", "  ├┬┘├┤ ├┤ ││  │  ".bold().cyan());
    println!("{}", "  ┴└─└─┘└  ┴┴─┘┴─┘".bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Refill Controller".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!();
}
