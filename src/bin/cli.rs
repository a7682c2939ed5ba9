//! FlatKV CLI
//!
//! One-shot commands against a data directory.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use flatkv::{Config, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// FlatKV CLI
#[derive(Parser, Debug)]
#[command(name = "flatkv-cli")]
#[command(about = "CLI for a FlatKV data directory")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./flatkv_data")]
    data_dir: String,

    /// Skip fsync when flushing
    #[arg(long)]
    no_sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair (flushed before exit)
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key (flushed before exit)
    Del {
        /// The key to delete
        key: String,
    },

    /// Rewrite the segment
    Flush,

    /// Print segment statistics
    Stats,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .sync_on_flush(!args.no_sync)
        .build();

    match run(config, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config, command: Commands) -> flatkv::Result<()> {
    let store = Store::open(config)?;

    match command {
        Commands::Get { key } => match store.get(key.as_bytes())? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => println!("(nil)"),
        },
        Commands::Set { key, value } => {
            store.set(key.as_bytes(), value.as_bytes())?;
            store.flush()?;
            println!("OK");
        }
        Commands::Del { key } => {
            store.delete(key.as_bytes())?;
            store.flush()?;
            println!("OK");
        }
        Commands::Flush => {
            let stats = store.flush()?;
            println!(
                "records={} dropped={} bytes={}",
                stats.records_written, stats.records_dropped, stats.bytes_written
            );
        }
        Commands::Stats => {
            println!("dir={}", store.dir().display());
            println!("keys={}", store.indexed_len());
            println!("segment_bytes={}", store.segment_size());
        }
    }

    Ok(())
}
