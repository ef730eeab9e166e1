//! `seeker-cli` – runs the heat-seeking control core on simulated hardware.
//!
//! The binary:
//!
//! 1. Loads `~/.seeker/config.toml`, writing the defaults on first run.
//! 2. Builds a simulated robot inside the configured thermal scene.
//! 3. Forwards every character typed on stdin to the remote command channel
//!    (`S` stop, `A` attach, `F`/`B` forward/backward, `L`/`R` spin).
//! 4. Halts the hardware and exits on **Ctrl-C**, or with a non-zero status
//!    after an emergency halt.

mod config;

use colored::Colorize;
use std::time::Duration;
use seeker_hal::sim::SimRegistry;
use seeker_runtime::remote::{self, RemoteSender};
use seeker_runtime::{Scheduler, init_tracing};
use seeker_types::{SeekerError, StatusReport};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, warn};

fn main() {
    // Tracing first: the OTLP exporter is created outside the Tokio runtime.
    let guard = init_tracing("seeker");

    print_banner();
    let cfg = load_config();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start the async runtime".red(), e);
            drop(guard);
            std::process::exit(1);
        }
    };

    let code = match runtime.block_on(run(cfg)) {
        Ok(()) => {
            println!("{}", "  ✓ Hardware halted. Goodbye.".green());
            0
        }
        Err(e) => {
            println!("{} {}", "  ✗ Emergency halt:".red().bold(), e);
            1
        }
    };

    // A pending stdin read would otherwise block the shutdown.
    runtime.shutdown_timeout(Duration::from_millis(500));
    drop(guard);
    std::process::exit(code);
}

async fn run(cfg: config::Config) -> Result<(), SeekerError> {
    let scene = cfg.simulation;
    let (hardware, handles) = SimRegistry::new()
        .with_ambient(scene.ambient)
        .with_range(scene.heat_range)
        .build();
    if scene.heat_source > 0 {
        handles.thermal.set_pixels(scene.heat_source);
    }

    let scheduler = Scheduler::new(cfg.scheduler, cfg.behavior);
    let (tx, source) = remote::channel();
    tokio::spawn(forward_stdin(tx));
    tokio::spawn(report_status(scheduler.observe().status));

    print_controls(cfg.scheduler.remote_period_ms);
    scheduler.run(hardware, Box::new(source), shutdown_signal()).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

fn load_config() -> config::Config {
    match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Background tasks
// ─────────────────────────────────────────────────────────────────────────────

/// Every non-whitespace character on stdin becomes one remote code.
async fn forward_stdin(tx: RemoteSender) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                for code in line.chars().filter(|c| !c.is_whitespace()) {
                    if tx.send(code).await.is_err() {
                        return;
                    }
                }
            }
            Ok(None) => {
                debug!("stdin closed; no further remote commands");
                return;
            }
            Err(e) => {
                warn!(error = %e, "stdin read failed; no further remote commands");
                return;
            }
        }
    }
}

/// Print a line whenever the command, phase or motion changes.
async fn report_status(mut rx: watch::Receiver<StatusReport>) {
    let mut last = None;
    while rx.changed().await.is_ok() {
        let report = *rx.borrow_and_update();
        let key = (report.command, report.phase, report.motion);
        if last == Some(key) {
            continue;
        }
        last = Some(key);
        println!(
            "  {} {:?}  {} {:?}  {} {:?}  {} {:?}",
            "command".dimmed(),
            report.command,
            "phase".dimmed(),
            report.phase,
            "motion".dimmed(),
            report.motion,
            "led".dimmed(),
            report.indicator,
        );
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            println!();
            println!("{}", "⚠  Ctrl-C received – halting …".yellow().bold());
        }
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl-C; running until an activity fails");
            std::future::pending::<()>().await;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ____            __           "#.bold().red());
    println!("{}", r#"  / __/__ ___ ___ / /_____ ____ "#.bold().red());
    println!("{}", r#" _\ \/ -_) -_) -_)  '_/ -_) __/ "#.bold().red());
    println!("{}", r#"/___/\__/\__/\__/_/\_\\__/_/    "#.bold().red());
    println!();
    println!(
        "  {} {}",
        "Seeker".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Heat-seeking robot control core (simulated hardware)");
    println!();
}

fn print_controls(remote_period_ms: u64) {
    println!();
    println!(
        "  Type a command and press Enter: {}top {}ttach {}orward {}ackward {}eft {}ight",
        "S".bold().cyan(),
        "A".bold().cyan(),
        "F".bold().cyan(),
        "B".bold().cyan(),
        "L".bold().cyan(),
        "R".bold().cyan(),
    );
    println!(
        "  {}",
        format!("Commands are picked up every {remote_period_ms} ms; Ctrl-C halts.").dimmed()
    );
    println!();
}
