//! Shared domain types.
//!
//! Everything here is plain data: snapshots as delivered by the feed,
//! normalized observations, reduction results and the run configuration.

use chrono::NaiveDate;

use crate::error::RatesError;

/// One raw `<Valute>` record, values kept as the feed wrote them.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub id: String,
    /// Numeric ISO code as text (`"036"` keeps its leading zero).
    pub num_code: String,
    pub char_code: String,
    /// Number of currency units the quoted value refers to.
    pub nominal: u32,
    pub name: String,
    /// Decimal text, usually with a comma separator (`"90,5012"`).
    pub value: String,
}

/// One daily document.
///
/// `date` is the date the feed stamped on the document, which is the latest
/// business day on or before the requested date.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub name: String,
    pub entries: Vec<RawRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub code: String,
    pub value: f64,
    pub date: NaiveDate,
}

impl Observation {
    pub fn new(code: impl Into<String>, value: f64, date: NaiveDate) -> Self {
        Self {
            code: code.into(),
            value,
            date,
        }
    }
}

/// Global maximum or minimum observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Extremum {
    pub code: String,
    pub value: f64,
    pub date: NaiveDate,
}

impl From<&Observation> for Extremum {
    fn from(obs: &Observation) -> Self {
        Self {
            code: obs.code.clone(),
            value: obs.value,
            date: obs.date,
        }
    }
}

/// Result of reducing a completed store.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub max: Extremum,
    pub min: Extremum,
    /// Mean over every observation of every currency combined.
    pub mean: f64,
    pub observations: usize,
    pub currencies: usize,
}

/// Min/max/mean of a single currency's series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStats {
    pub code: String,
    pub max: Extremum,
    pub min: Extremum,
    pub mean: f64,
    pub observations: usize,
}

/// What to do when some dates of the window fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Skip failed dates; fail only when no date succeeded.
    #[default]
    Skip,
    /// Any failed date fails the run.
    Strict,
}

pub const DEFAULT_BASE_URL: &str = "https://www.cbr.ru/scripts/XML_daily_eng.asp?date_req=";
pub const DEFAULT_WINDOW_DAYS: u32 = 90;
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Parameters of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// The window walks backward from this date, excluding it.
    pub start: NaiveDate,
    pub days: u32,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub base_url: String,
    pub policy: FailurePolicy,
}

impl RunConfig {
    pub fn new(start: NaiveDate) -> Self {
        Self {
            start,
            days: DEFAULT_WINDOW_DAYS,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: DEFAULT_BASE_URL.to_string(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn validate(&self) -> Result<(), RatesError> {
        if self.days == 0 {
            return Err(RatesError::Config("window must cover at least one day".into()));
        }
        if self.concurrency == 0 {
            return Err(RatesError::Config("concurrency must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(RatesError::Config("timeout must be at least 1 second".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(RatesError::Config("base URL is empty".into()));
        }
        Ok(())
    }
}
