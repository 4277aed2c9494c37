//! emberkv CLI
//!
//! Command-line interface for poking at an emberkv data directory.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use emberkv::Engine;

/// emberkv CLI
#[derive(Parser, Debug)]
#[command(name = "emberkv")]
#[command(about = "Embedded key-value engine with a log-backed B+tree index")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./emberkv_data")]
    data_dir: String,

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

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List key-value pairs in ascending key order
    Scan {
        /// Lower bound (inclusive); empty means before all keys
        #[arg(default_value = "")]
        lower: String,

        /// Upper bound (inclusive); empty means after all keys
        #[arg(default_value = "")]
        upper: String,
    },

    /// Compact the log and wait for it to finish
    Compact,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    let engine = match Engine::open_path(args.data_dir.as_ref()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("failed to open engine at {}: {}", args.data_dir, e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Commands::Get { key } => match engine.get(key.as_bytes()) {
            Ok(Some(value)) => {
                println!("{}", String::from_utf8_lossy(&value));
                Ok(())
            }
            Ok(None) => {
                eprintln!("(not found)");
                std::process::exit(2);
            }
            Err(e) => Err(e),
        },
        Commands::Set { key, value } => engine
            .put(key.as_bytes(), value.as_bytes())
            .and_then(|_| engine.sync()),
        Commands::Del { key } => match engine.remove(key.as_bytes()).and_then(|_| engine.sync()) {
            Err(e) if e.is_not_found() => {
                eprintln!("(not found)");
                std::process::exit(2);
            }
            other => other,
        },
        Commands::Scan { lower, upper } => engine.visit(lower.as_bytes(), upper.as_bytes(), |k, v| {
            println!("{}\t{}", String::from_utf8_lossy(k), String::from_utf8_lossy(v));
        }),
        Commands::Compact => engine.garbage_collect().and_then(|_| engine.wait_for_gc()),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
