//! Command-line parsing for the CBR rates aggregator.
//!
//! Parsing and dispatch are kept apart from the pipeline so the library
//! can be driven without a process.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_SECS, DEFAULT_WINDOW_DAYS};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "rates", version, about = "Historical CBR exchange-rate summary")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the window and print the global maximum, minimum and mean.
    Summary(RunArgs),
    /// Fetch the window and print one currency's series with its own stats.
    Series(SeriesArgs),
}

/// Options shared by every command that runs the pipeline.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Number of days to fetch, walking backward from the end date.
    #[arg(short = 'd', long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub days: u32,

    /// Window end (exclusive), YYYY-MM-DD. Defaults to today in UTC.
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<NaiveDate>,

    /// Maximum simultaneous requests.
    #[arg(short = 'j', long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Feed base URL; the request date is appended as DD/MM/YYYY.
    /// Falls back to `CBR_RATES_BASE_URL`, then the public CBR endpoint.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Fail the run if any date fails instead of skipping it.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SeriesArgs {
    /// Currency character code, e.g. USD.
    #[arg(short, long)]
    pub code: String,

    #[command(flatten)]
    pub run: RunArgs,
}
