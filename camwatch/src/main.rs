//! camwatch: health monitor for DVR camera fleets.
//!
//! Polls every configured DVR over ISAPI once per interval, tracks
//! per-entity health transitions (device connection, digital and analog
//! camera channels) and notifies the configured sinks on every change.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

mod client;
mod config;
mod engine;
mod event;
mod logging;
mod notify;
mod outage_log;
mod scheduler;
mod state;

use client::DeviceClient;
use config::ConfigFile;
use notify::Notifier;
use outage_log::OutageLog;
use scheduler::Monitor;
use state::StateStore;

/// How long the menu waits for input before auto-starting monitoring.
const AUTO_START_SECS: u64 = 30;

/// camwatch - DVR camera fleet health monitor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'f', long, default_value = "camwatch.toml")]
    config: PathBuf,

    /// Poll interval in seconds (overrides the config file)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Directory where log files are stored
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Number of days to keep log files
    #[arg(long, default_value = "7")]
    log_retention_days: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Start monitoring immediately, without the interactive menu
    #[arg(long)]
    run: bool,
}

/// One monitoring run: scheduler plus notifier, stoppable as a unit.
struct Session {
    cancel: CancellationToken,
    store: Arc<StateStore>,
    monitor: JoinHandle<()>,
    notifier: JoinHandle<()>,
}

impl Session {
    fn start(config: Arc<ConfigFile>, interval: Duration) -> Self {
        info!("Starting monitoring...");

        let store = Arc::new(StateStore::new(
            config.devices.iter().map(|d| d.name.clone()),
        ));
        let (events_tx, events_rx) = mpsc::channel(256);
        let cancel = CancellationToken::new();

        let notifier = Notifier::new(
            events_rx,
            config.telegram.as_ref(),
            OutageLog::new(config.monitor.outage_log()),
        )
        .start();

        let monitor = Monitor::new(
            Arc::clone(&config),
            Arc::clone(&store),
            DeviceClient::new(config.monitor.probe_timeout()),
            interval,
            events_tx,
            cancel.clone(),
        )
        .start();

        Self {
            cancel,
            store,
            monitor,
            notifier,
        }
    }

    /// Cancel the cycle loop, wait for every in-flight worker to terminate,
    /// then reset all entity state. The reset only happens after the workers
    /// are gone, so no partially-cleared state is ever observable.
    async fn stop(self) {
        info!("Monitoring stopped.");
        self.cancel.cancel();
        let _ = self.monitor.await;
        let _ = self.notifier.await;
        self.store.reset().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    logging::init_logging(&args.log_dir, args.log_retention_days, args.verbose)
        .expect("Failed to initialize logging");

    let config = match config::load_config(&args.config) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    info!(
        "camwatch starting: {} device(s) configured from {}",
        config.devices.len(),
        args.config.display()
    );

    let default_interval = args
        .interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.monitor.interval());

    if args.run {
        run_headless(config, default_interval).await;
    } else {
        run_menu(config, default_interval).await?;
    }

    info!("Program exited.");
    Ok(())
}

/// Non-interactive mode: monitor until Ctrl+C.
async fn run_headless(config: Arc<ConfigFile>, interval: Duration) {
    let session = Session::start(config, interval);
    let _ = tokio::signal::ctrl_c().await;
    info!("Monitoring stopped by user.");
    session.stop().await;
}

/// Interactive menu: start/stop monitoring, exit. Auto-starts with the
/// default interval if nothing is entered within [`AUTO_START_SECS`].
async fn run_menu(
    config: Arc<ConfigFile>,
    default_interval: Duration,
) -> Result<(), std::io::Error> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session: Option<Session> = None;
    let mut auto_start_armed = true;

    loop {
        println!("========== DVR Monitoring Program ==========");
        println!("1. Start Monitoring");
        println!("2. Stop Monitoring");
        println!("3. Exit");
        prompt("Select an option (1-3): ")?;

        let choice = if auto_start_armed {
            auto_start_armed = false;
            tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::time::sleep(Duration::from_secs(AUTO_START_SECS)) => {
                    println!(
                        "No input detected for {} seconds. Starting monitoring with default interval.",
                        AUTO_START_SECS
                    );
                    info!("Auto-starting monitoring with default interval.");
                    session = Some(Session::start(Arc::clone(&config), default_interval));
                    continue;
                }
            }
        } else {
            lines.next_line().await?
        };

        match choice.as_deref().map(str::trim) {
            Some("1") => {
                if session.is_some() {
                    println!("Monitoring is already running.");
                    continue;
                }
                let interval = read_interval(&mut lines, default_interval).await?;
                session = Some(Session::start(Arc::clone(&config), interval));
                println!("Monitoring started.");
            }
            Some("2") => match session.take() {
                Some(session) => {
                    println!("Stopping monitoring...");
                    session.stop().await;
                    println!("Statuses have been reset.");
                }
                None => println!("Monitoring is not running."),
            },
            Some("3") | None => {
                // None means stdin closed; treat it like exit.
                println!("Exiting the program...");
                if let Some(session) = session.take() {
                    session.stop().await;
                }
                break;
            }
            _ => println!("Invalid choice, please select again."),
        }
    }

    Ok(())
}

/// Ask for a poll interval; empty input keeps the default, anything else
/// must be a positive integer number of seconds.
async fn read_interval(
    lines: &mut Lines<BufReader<Stdin>>,
    default_interval: Duration,
) -> Result<Duration, std::io::Error> {
    loop {
        prompt(&format!(
            "Enter the DVRs check period in seconds (default is {}): ",
            default_interval.as_secs()
        ))?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => return Ok(default_interval),
        };
        let input = line.trim();

        if input.is_empty() {
            println!(
                "No input detected. Using default value: {} seconds.",
                default_interval.as_secs()
            );
            return Ok(default_interval);
        }
        match input.parse::<u64>() {
            Ok(secs) if secs > 0 => return Ok(Duration::from_secs(secs)),
            _ => println!("Invalid input. Please enter a positive integer."),
        }
    }
}

fn prompt(text: &str) -> Result<(), std::io::Error> {
    print!("{}", text);
    std::io::stdout().flush()
}
