//! FlatKV Load Driver
//!
//! Hammers a store with random set → get → (sometimes) delete loops on
//! several threads while a background thread flushes on a timer. Every
//! `get` must return the value its own thread just set; any mismatch is
//! reported and makes the process exit non-zero.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam::channel::{self, Receiver, TryRecvError};
use flatkv::{Config, Store};
use rand::Rng;
use tracing_subscriber::{fmt, EnvFilter};

/// FlatKV load driver
#[derive(Parser, Debug)]
#[command(name = "flatkv-fuzz")]
#[command(about = "Concurrent set/get/delete load against a FlatKV store with periodic flushes")]
#[command(version)]
struct Args {
    /// Data directory (a temporary one is used when omitted)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Worker threads
    #[arg(short, long, default_value = "4")]
    threads: usize,

    /// How long to run, in seconds
    #[arg(short = 's', long, default_value = "10")]
    duration_secs: u64,

    /// Interval between background flushes, in milliseconds
    #[arg(short, long, default_value = "1000")]
    flush_interval_ms: u64,

    /// Distinct keys per worker
    #[arg(short, long, default_value = "50000")]
    keys: u32,

    /// Probability of deleting a key after verifying it
    #[arg(long, default_value = "0.1", value_parser = parse_ratio)]
    delete_ratio: f64,

    /// Skip fsync when flushing
    #[arg(long)]
    no_sync: bool,
}

fn parse_ratio(s: &str) -> Result<f64, String> {
    let ratio: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(format!("{} is not in 0.0..=1.0", s));
    }
    Ok(ratio)
}

#[derive(Default)]
struct Counters {
    verified: AtomicU64,
    mismatches: AtomicU64,
    errors: AtomicU64,
    flushes: AtomicU64,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,flatkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    // Keep the temporary directory alive for the whole run
    let temp_dir;
    let data_dir = match &args.data_dir {
        Some(dir) => dir.clone(),
        None => match tempfile::tempdir() {
            Ok(dir) => {
                temp_dir = dir;
                temp_dir.path().to_path_buf()
            }
            Err(e) => {
                tracing::error!("Failed to create temporary directory: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    tracing::info!("FlatKV load driver v{}", flatkv::VERSION);
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::builder()
        .data_dir(&data_dir)
        .sync_on_flush(!args.no_sync)
        .build();

    let store = match Store::open(config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let counters = Counters::default();
    let (stop_tx, stop_rx) = channel::bounded::<()>(0);
    let start = Instant::now();

    let scoped = crossbeam::scope(|s| {
        for worker in 0..args.threads {
            let stop_rx = stop_rx.clone();
            let (store, counters, args) = (&store, &counters, &args);
            s.spawn(move |_| run_worker(worker, store, counters, args, &stop_rx));
        }

        {
            let stop_rx = stop_rx.clone();
            let (store, counters) = (&store, &counters);
            let interval = Duration::from_millis(args.flush_interval_ms);
            s.spawn(move |_| run_flusher(store, counters, interval, stop_rx));
        }

        {
            let stop_rx = stop_rx.clone();
            let counters = &counters;
            s.spawn(move |_| run_reporter(counters, start, stop_rx));
        }

        std::thread::sleep(Duration::from_secs(args.duration_secs));
        // Disconnecting the channel stops every thread
        drop(stop_tx);
    });

    if scoped.is_err() {
        tracing::error!("A worker thread panicked");
        return ExitCode::FAILURE;
    }

    let elapsed = start.elapsed().as_secs_f64();
    let verified = counters.verified.load(Ordering::Relaxed);
    let mismatches = counters.mismatches.load(Ordering::Relaxed);
    let errors = counters.errors.load(Ordering::Relaxed);

    tracing::info!(
        verified,
        mismatches,
        errors,
        flushes = counters.flushes.load(Ordering::Relaxed),
        "sets/s: {:.0}",
        verified as f64 / elapsed
    );

    if mismatches > 0 || errors > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn stopped(stop_rx: &Receiver<()>) -> bool {
    matches!(stop_rx.try_recv(), Err(TryRecvError::Disconnected))
}

/// set → get (verify) → sometimes delete, on this worker's own keys
fn run_worker(worker: usize, store: &Store, counters: &Counters, args: &Args, stop_rx: &Receiver<()>) {
    let mut rng = rand::thread_rng();

    while !stopped(stop_rx) {
        let key = format!("{}-{}", worker, rng.gen_range(0..args.keys.max(1)));
        let value = rng.gen_range(0..100_000u32).to_string();

        let result = store
            .set(key.as_bytes(), value.as_bytes())
            .and_then(|_| store.get(key.as_bytes()));

        match result {
            Ok(Some(actual)) if actual == value.as_bytes() => {
                counters.verified.fetch_add(1, Ordering::Relaxed);
                if rng.gen_bool(args.delete_ratio) {
                    if let Err(e) = store.delete(key.as_bytes()) {
                        tracing::error!(%key, "delete failed: {}", e);
                        counters.errors.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            Ok(actual) => {
                tracing::error!(
                    %key,
                    expected = %value,
                    actual = ?actual.as_deref().map(String::from_utf8_lossy),
                    "bad key/value"
                );
                counters.mismatches.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!(%key, "set/get failed: {}", e);
                counters.errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

fn run_flusher(store: &Store, counters: &Counters, interval: Duration, stop_rx: Receiver<()>) {
    let ticker = channel::tick(interval);

    loop {
        channel::select! {
            recv(ticker) -> _ => match store.flush() {
                Ok(_) => {
                    counters.flushes.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    tracing::error!("flush failed: {}", e);
                    counters.errors.fetch_add(1, Ordering::Relaxed);
                }
            },
            recv(stop_rx) -> _ => break,
        }
    }
}

fn run_reporter(counters: &Counters, start: Instant, stop_rx: Receiver<()>) {
    let ticker = channel::tick(Duration::from_secs(1));

    loop {
        channel::select! {
            recv(ticker) -> _ => {
                let elapsed = start.elapsed().as_secs_f64();
                let verified = counters.verified.load(Ordering::Relaxed);
                println!(
                    "time:{:.0}\tsets:\t{:.0}/s",
                    elapsed,
                    verified as f64 / elapsed
                );
            },
            recv(stop_rx) -> _ => break,
        }
    }
}
