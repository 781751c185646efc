//! Shared fetch → extract → aggregate → reduce pipeline.
//!
//! One task per date runs on a bounded worker pool; every task reports a
//! `DateOutcome` and the pool is joined before the failure policy and the
//! reducer look at the store.

use std::time::Duration;

use chrono::NaiveDate;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::data::{HttpFetcher, SnapshotSource, extract};
use crate::domain::{FailurePolicy, RunConfig, Summary};
use crate::error::{DateFailure, RatesError};
use crate::report::reduce;
use crate::store::AggregateStore;

/// Result of one date's fetch + extract + append.
#[derive(Debug)]
pub enum DateOutcome {
    Fetched {
        requested: NaiveDate,
        /// Date stamped on the document; earlier than `requested` on non-business days.
        snapshot_date: NaiveDate,
        observations: usize,
    },
    Failed {
        requested: NaiveDate,
        error: RatesError,
    },
}

impl DateOutcome {
    pub fn requested(&self) -> NaiveDate {
        match self {
            Self::Fetched { requested, .. } | Self::Failed { requested, .. } => *requested,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }
}

/// Outcomes of a run, in window order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<DateOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = DateFailure> + '_ {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            DateOutcome::Failed { requested, error } => Some(DateFailure {
                date: *requested,
                kind: error.kind(),
                message: error.to_string(),
            }),
            DateOutcome::Fetched { .. } => None,
        })
    }
}

/// Everything a successful run produced.
#[derive(Debug)]
pub struct PipelineOutput {
    pub store: AggregateStore,
    pub report: RunReport,
    pub summary: Summary,
}

/// `days` dates walking backward from `start`, `start` itself excluded.
pub fn window_dates(start: NaiveDate, days: u32) -> Vec<NaiveDate> {
    std::iter::successors(start.pred_opt(), |d| d.pred_opt())
        .take(days as usize)
        .collect()
}

fn fetch_into<S>(source: &S, store: &AggregateStore, date: NaiveDate) -> DateOutcome
where
    S: SnapshotSource + ?Sized,
{
    log::debug!("fetching {date}");
    let result = source.fetch(date).and_then(|snapshot| {
        let observations = extract(&snapshot)?;
        Ok((snapshot.date, observations))
    });

    match result {
        Ok((snapshot_date, observations)) => {
            let count = observations.len();
            store.extend(observations);
            log::debug!("{date}: {count} observations dated {snapshot_date}");
            DateOutcome::Fetched {
                requested: date,
                snapshot_date,
                observations: count,
            }
        }
        Err(error) => {
            log::debug!("{date}: {error}");
            DateOutcome::Failed {
                requested: date,
                error,
            }
        }
    }
}

/// Fan out one task per date on `concurrency` workers and wait for all of them.
pub fn collect<S>(
    source: &S,
    store: &AggregateStore,
    dates: &[NaiveDate],
    concurrency: usize,
) -> Result<RunReport, RatesError>
where
    S: SnapshotSource + ?Sized,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|i| format!("rates-fetch-{i}"))
        .build()
        .map_err(|e| RatesError::Runtime(e.to_string()))?;

    // `collect` returns only once every task has finished.
    let outcomes = pool.install(|| {
        dates
            .par_iter()
            .map(|&date| fetch_into(source, store, date))
            .collect::<Vec<_>>()
    });

    Ok(RunReport { outcomes })
}

/// Decide whether the failed dates of a run fail the run.
pub fn apply_policy(report: &RunReport, policy: FailurePolicy) -> Result<(), RatesError> {
    let failures: Vec<DateFailure> = report.failures().collect();
    if failures.is_empty() {
        return Ok(());
    }

    let fatal = match policy {
        FailurePolicy::Strict => true,
        FailurePolicy::Skip => report.succeeded() == 0,
    };
    if fatal {
        return Err(RatesError::Aggregation { failures });
    }

    for failure in &failures {
        log::warn!("skipping {failure}");
    }
    Ok(())
}

/// Fetch the window into a fresh store and apply the failure policy.
pub fn gather<S>(source: &S, config: &RunConfig) -> Result<(AggregateStore, RunReport), RatesError>
where
    S: SnapshotSource + ?Sized,
{
    config.validate()?;

    let dates = window_dates(config.start, config.days);
    log::info!(
        "fetching {} days before {} with {} workers",
        dates.len(),
        config.start,
        config.concurrency
    );

    let store = AggregateStore::new();
    let report = collect(source, &store, &dates, config.concurrency)?;
    apply_policy(&report, config.policy)?;

    let duplicates = store.duplicate_count();
    if duplicates > 0 {
        log::warn!("{duplicates} observations repeat an existing (currency, date) pair");
    }
    log::info!(
        "{}/{} dates fetched, {} observations across {} currencies",
        report.succeeded(),
        dates.len(),
        store.observation_count(),
        store.len()
    );

    Ok((store, report))
}

/// Gather and reduce using any snapshot source.
pub fn run_with_source<S>(source: &S, config: &RunConfig) -> Result<PipelineOutput, RatesError>
where
    S: SnapshotSource + ?Sized,
{
    let (store, report) = gather(source, config)?;
    let summary = reduce(&store)?;
    Ok(PipelineOutput {
        store,
        report,
        summary,
    })
}

/// Build the HTTP fetcher for `config`.
pub fn http_source(config: &RunConfig) -> Result<HttpFetcher, RatesError> {
    HttpFetcher::new(&config.base_url, Duration::from_secs(config.timeout_secs))
}

/// Execute the full pipeline against the live feed.
pub fn run(config: &RunConfig) -> Result<PipelineOutput, RatesError> {
    // Reject bad settings before a client is built from them.
    config.validate()?;
    let source = http_source(config)?;
    run_with_source(&source, config)
}
