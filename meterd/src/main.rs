mod config;
mod worker;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use accounting::{ProcTrafficSource, SystemClock, UsageAccumulator};
use anyhow::{Context, Result};
use clap::Parser;
use common::SqliteKvStore;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "meterd")]
#[command(about = "netmeter daemon - durable network usage accounting", long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "meterd.toml")]
    config: String,

    /// SQLite database path
    #[arg(long, env = "METERD_DATABASE_PATH")]
    database_path: Option<String>,

    /// Interface to meter (all non-loopback interfaces when unset)
    #[arg(long, env = "METERD_INTERFACE")]
    interface: Option<String>,

    /// Seconds between reconciliation runs
    #[arg(long, env = "METERD_CHECK_INTERVAL")]
    check_interval_secs: Option<u64>,

    /// Run a single reconciliation and exit
    #[arg(long)]
    once: bool,

    /// Print the current usage snapshot as JSON and exit
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = if Path::new(&args.config).exists() {
        config::MeterConfig::load(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config))?
    } else {
        let cfg = config::MeterConfig::default();
        cfg.save(&args.config)?;
        cfg
    };

    // Override with command line arguments
    if let Some(database_path) = args.database_path {
        cfg.database_path = database_path;
    }
    if let Some(interface) = args.interface {
        cfg.interface = Some(interface);
    }
    if let Some(check_interval_secs) = args.check_interval_secs {
        cfg.check_interval_secs = check_interval_secs;
    }

    let _log_guard = common::init_tracing(cfg.log_dir.as_deref(), "meterd.log", &cfg.log_level);

    info!("Starting meterd with configuration: {:?}", cfg);

    let store = Arc::new(
        SqliteKvStore::open(&cfg.database_path)
            .await
            .with_context(|| format!("Failed to open store at {}", cfg.database_path))?,
    );

    let mut source = ProcTrafficSource::with_path(&cfg.net_dev_path);
    if let Some(interface) = &cfg.interface {
        source = source.for_interface(interface.clone());
    }
    let clock = SystemClock::with_uptime_path(&cfg.uptime_path);

    let accumulator = Arc::new(UsageAccumulator::with_window_days(
        store,
        Arc::new(source),
        Arc::new(clock),
        cfg.window_days,
    ));

    if args.report {
        let snapshot = accumulator.snapshot().await?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    if args.once {
        accumulator.run_once().await?;
        let snapshot = accumulator.snapshot().await?;
        info!(
            "Window totals: {:.3} MB down / {:.3} MB up",
            snapshot.rx_megabytes(),
            snapshot.tx_megabytes()
        );
        return Ok(());
    }

    let (handle, worker_task) = worker::UsageWorker::spawn(accumulator);

    info!(
        "meterd started, reconciling every {}s",
        cfg.check_interval_secs
    );

    // The first tick fires immediately, so the startup run needs no special
    // casing.
    let mut interval = tokio::time::interval(Duration::from_secs(cfg.check_interval_secs.max(1)));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if !handle.trigger_check() {
                    error!("Usage worker stopped unexpectedly");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    drop(handle);
    let _ = worker_task.await;

    info!("Shutting down meterd");
    Ok(())
}
