//! DriftKV CLI
//!
//! Command-line access to a DriftKV log file.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use driftkv::{Config, Engine, TailPolicy};
use tracing_subscriber::{fmt, EnvFilter};

/// DriftKV CLI
#[derive(Parser, Debug)]
#[command(name = "driftkv-cli")]
#[command(about = "CLI for the DriftKV embedded key-value store")]
#[command(version)]
struct Args {
    /// Log file to operate on (created if absent)
    #[arg(short, long, default_value = "./driftkv.db")]
    file: String,

    /// How to treat a torn record at the end of the log
    #[arg(long, value_enum, default_value_t = Tail::Strict)]
    tail: Tail,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Tail {
    Strict,
    Truncate,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// List every key
    Keys,

    /// Rebuild the index from the log and compare
    Verify,

    /// Print replay and size statistics
    Stats,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,driftkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> driftkv::Result<ExitCode> {
    let tail_policy = match args.tail {
        Tail::Strict => TailPolicy::Strict,
        Tail::Truncate => TailPolicy::Truncate,
    };

    let config = Config::builder()
        .path(&args.file)
        .tail_policy(tail_policy)
        .build();

    let engine = Engine::open_with_config(config)?;

    let code = match args.command {
        Commands::Get { key } => match engine.get(key.as_bytes())? {
            Some(value) => {
                println!("{}", String::from_utf8_lossy(&value));
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("(not found)");
                ExitCode::from(2)
            }
        },
        Commands::Set { key, value } => {
            engine.set(key.as_bytes(), value.as_bytes())?;
            ExitCode::SUCCESS
        }
        Commands::Keys => {
            let mut keys = engine.keys();
            keys.sort();
            for key in keys {
                println!("{}", String::from_utf8_lossy(&key));
            }
            ExitCode::SUCCESS
        }
        Commands::Verify => {
            let check = engine.verify_index()?;
            if check.is_consistent() {
                println!("ok: {} records, {} keys", check.records, engine.len());
                ExitCode::SUCCESS
            } else {
                println!(
                    "mismatch: {} missing, {} stale, {} unexpected",
                    check.diff.missing.len(),
                    check.diff.stale.len(),
                    check.diff.unexpected.len()
                );
                ExitCode::FAILURE
            }
        }
        Commands::Stats => {
            let stats = engine.replay_stats();
            println!("records:         {}", stats.records);
            println!("keys:            {}", stats.keys);
            println!("superseded:      {}", stats.superseded);
            println!("truncated bytes: {}", stats.truncated_bytes);
            println!("log bytes:       {}", engine.log_size());
            ExitCode::SUCCESS
        }
    };

    engine.close()?;
    Ok(code)
}
