//! vmprobed - Standalone vmstat probe runner.
//!
//! Starts the vmstat probe, drains collected points periodically and writes
//! them as JSON lines (one point per line, preceded by a meta-info line) to
//! stdout or a file. Stops cleanly on Ctrl-C, flushing whatever the probe
//! collected up to the shutdown.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use vmprobe::config::ProbeConfig;
use vmprobe::probe::{Probe, ProbePoint, VmStatProbe};

/// Standalone vmstat probe runner.
#[derive(Parser)]
#[command(name = "vmprobed", about = "vmstat probe runner", version)]
struct Args {
    /// Sampling interval in seconds, passed through to vmstat.
    #[arg(short, long, default_value = "1")]
    interval: u64,

    /// Path to the vmstat executable.
    #[arg(long, default_value = "vmstat")]
    vmstat_path: String,

    /// Options passed to vmstat, split on whitespace.
    #[arg(long, default_value = "-n")]
    vmstat_opts: String,

    /// Seconds between drains of the collected points.
    #[arg(short, long, default_value = "5")]
    drain_interval: u64,

    /// Output file for JSON lines. Defaults to stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("vmprobed={}", level).parse().unwrap())
        .add_directive(format!("vmprobe={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Writes one batch of drained points as JSON lines.
fn write_points(out: &mut dyn Write, points: &[ProbePoint]) -> io::Result<()> {
    for point in points {
        let line = serde_json::to_string(point)?;
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let cfg = ProbeConfig {
        interval_secs: args.interval,
        vmstat_path: args.vmstat_path.clone(),
        vmstat_opts: args.vmstat_opts.clone(),
    };

    info!("vmprobed {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: interval={}s, path={}, opts='{}', drain_every={}s",
        cfg.interval_secs, cfg.vmstat_path, cfg.vmstat_opts, args.drain_interval
    );

    let mut out: Box<dyn Write> = match args.output {
        Some(ref path) => match File::create(path) {
            Ok(f) => Box::new(BufWriter::new(f)),
            Err(e) => {
                eprintln!("Error: cannot create output file '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => Box::new(io::stdout()),
    };

    let mut probe = VmStatProbe::new();
    if let Err(e) = probe.start(&cfg) {
        eprintln!("Error: failed to start probe: {}", e);
        std::process::exit(1);
    }

    // First output line describes the columns of every following point.
    let meta = serde_json::json!({ "meta_info": probe.meta_info() });
    if let Err(e) = writeln!(out, "{}", meta) {
        error!("Failed to write meta info: {}", e);
    }

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let drain_interval = Duration::from_secs(args.drain_interval.max(1));
    let mut batch_count: u64 = 0;

    while running.load(Ordering::SeqCst) {
        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = drain_interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }

        let points = probe.points();
        if points.is_empty() {
            debug!("Drain #{}: no points", batch_count);
        } else {
            batch_count += 1;
            info!("Drain #{}: {} points", batch_count, points.len());
        }
        if let Err(e) = write_points(out.as_mut(), &points) {
            error!("Failed to write points: {}", e);
        }
    }

    // Graceful shutdown: stop the probe, then flush what it collected
    // before the stop.
    info!("Shutting down...");
    probe.stop();

    let points = probe.points();
    if !points.is_empty() {
        info!("Flushing {} pending points", points.len());
        if let Err(e) = write_points(out.as_mut(), &points) {
            error!("Failed to write pending points: {}", e);
        }
    }

    info!("vmprobed stopped");
}
