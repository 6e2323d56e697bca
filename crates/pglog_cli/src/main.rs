//! pglog CLI
//!
//! Command-line tools for pglog spool directories.
//!
//! # Commands
//!
//! - `list` - List the segment files a scan would read
//! - `scan` - Print the rows of every segment
//! - `estimate` - Show the planner's size and cost estimates
//! - `analyze` - Count pages and records across all segments
//! - `spool` - Append events to the spool directory

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// pglog spool directory tools.
#[derive(Parser)]
#[command(name = "pglog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the spool directory
    #[arg(global = true, short, long)]
    dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the segment files a scan would read
    List {
        /// Segment file suffix
        #[arg(short, long, default_value = pglog_core::SEGMENT_SUFFIX)]
        suffix: String,

        /// Maximum number of segments
        #[arg(short, long, default_value_t = pglog_core::DEFAULT_MAX_FILES)]
        max_files: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the rows of every segment
    Scan {
        /// Stop after this many rows
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only show rows at or above this severity (e.g. warning)
        #[arg(short = 'm', long)]
        min_severity: Option<String>,

        /// Comma-separated columns to print
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the planner's size and cost estimates
    Estimate {
        /// Expected output row width in bytes
        #[arg(short, long, default_value_t = 176)]
        width: u32,

        /// Fraction of rows kept by predicates
        #[arg(short, long, default_value_t = 1.0)]
        selectivity: f64,

        /// Analyze the segments first and use the result
        #[arg(short, long)]
        analyze: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Count pages and records across all segments
    Analyze {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Append events to the spool directory (one per message, or stdin lines)
    Spool {
        /// Severity of the events
        #[arg(short, long, default_value = "log")]
        severity: String,

        /// Minimum severity that is spooled
        #[arg(short, long, default_value = "warning")]
        min_messages: String,

        /// SQL state code of the events
        #[arg(long)]
        sql_state: Option<String>,

        /// Messages to spool
        messages: Vec<String>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::List {
            suffix,
            max_files,
            format,
        } => {
            let dir = cli.dir.ok_or("Spool directory required for list")?;
            commands::list::run(&dir, &suffix, max_files, &format)?;
        }
        Commands::Scan {
            limit,
            min_severity,
            columns,
            format,
        } => {
            let dir = cli.dir.ok_or("Spool directory required for scan")?;
            commands::scan::run(&dir, limit, min_severity.as_deref(), &columns, &format)?;
        }
        Commands::Estimate {
            width,
            selectivity,
            analyze,
            format,
        } => {
            let dir = cli.dir.ok_or("Spool directory required for estimate")?;
            commands::estimate::run(&dir, width, selectivity, analyze, &format)?;
        }
        Commands::Analyze { format } => {
            let dir = cli.dir.ok_or("Spool directory required for analyze")?;
            commands::analyze::run(&dir, &format)?;
        }
        Commands::Spool {
            severity,
            min_messages,
            sql_state,
            messages,
        } => {
            let dir = cli.dir.ok_or("Spool directory required for spool")?;
            let options = commands::spool::SpoolOptions {
                severity,
                min_messages,
                sql_state,
            };
            commands::spool::run(&dir, &options, messages)?;
        }
        Commands::Version => {
            println!("pglog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("pglog Core v{}", pglog_core::VERSION);
        }
    }

    Ok(())
}
