//! Command-line interface for tag-tree
//!
//! Provides `scan` and `pattern` subcommands on top of the session.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod pattern;
mod scan;
mod utils;

pub use utils::parse_csv;

/// Find TODO, FIXME and friends and show them as a tree
#[derive(Parser)]
#[command(name = "tag-tree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan workspace folders and print the tag tree
    Scan(Box<scan::ScanArgs>),

    /// Print the expanded search pattern
    Pattern(pattern::PatternArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Scan(args) => scan::run(*args),
        Commands::Pattern(args) => pattern::run(args),
    }
}
