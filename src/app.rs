//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module:
//! - parses CLI arguments
//! - initialises logging
//! - assembles the run configuration (flags, `.env`, defaults)
//! - runs the pipeline and prints the result

use chrono::{NaiveDate, Utc};
use clap::Parser;

use crate::cli::{Command, RunArgs, SeriesArgs};
use crate::domain::{DEFAULT_BASE_URL, FailurePolicy, RunConfig};
use crate::error::AppError;

pub mod pipeline;

/// Environment variable overriding the feed base URL.
pub const BASE_URL_ENV: &str = "CBR_RATES_BASE_URL";

/// Entry point for the `rates` binary.
pub fn run() -> Result<(), AppError> {
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    match cli.command {
        Command::Summary(args) => handle_summary(args),
        Command::Series(args) => handle_series(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn handle_summary(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args, today_utc());
    let out = pipeline::run(&config)?;

    println!("{}", crate::report::format_summary(&out.summary));
    Ok(())
}

fn handle_series(args: SeriesArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.run, today_utc());
    config.validate()?;
    let source = pipeline::http_source(&config)?;
    let (store, _) = pipeline::gather(&source, &config)?;

    let code = args.code.trim().to_ascii_uppercase();
    let observations = store.series(&code).unwrap_or_default();
    let stats = crate::report::reduce_series(&code, &observations)
        .ok_or_else(|| AppError::new(5, format!("No observations for currency {code}.")))?;

    println!("{}", crate::report::format_series(&stats, &observations));
    Ok(())
}

fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Flags first, then `CBR_RATES_BASE_URL`, then built-in defaults.
pub fn run_config_from_args(args: &RunArgs, today: NaiveDate) -> RunConfig {
    let base_url = args
        .base_url
        .clone()
        .or_else(|| std::env::var(BASE_URL_ENV).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    RunConfig {
        start: args.end_date.unwrap_or(today),
        days: args.days,
        concurrency: args.concurrency,
        timeout_secs: args.timeout_secs,
        base_url,
        policy: if args.strict {
            FailurePolicy::Strict
        } else {
            FailurePolicy::Skip
        },
    }
}

/// Rewrite argv so `rates` defaults to `rates summary`.
///
/// Rules:
/// - `rates`                        -> `rates summary`
/// - `rates --days 30 ...`          -> `rates summary --days 30 ...`
/// - `rates --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("summary".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "summary" | "series");
    if is_subcommand {
        return argv;
    }

    // A leading flag means "summary flags"; `-v` is global and may come first.
    if arg1.starts_with('-') {
        let has_subcommand = argv
            .iter()
            .skip(1)
            .any(|a| matches!(a.as_str(), "summary" | "series"));
        if !has_subcommand {
            argv.insert(1, "summary".to_string());
        }
        return argv;
    }

    argv
}
