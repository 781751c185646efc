//! Error types.
//!
//! - `RatesError` is the library taxonomy returned by every pipeline stage.
//! - `AppError` is what the binary reports: a message plus a process exit code.

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

/// One failed date of a pipeline run.
#[derive(Debug, Clone)]
pub struct DateFailure {
    pub date: NaiveDate,
    pub kind: &'static str,
    pub message: String,
}

impl fmt::Display for DateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.date.format("%d.%m.%Y"), self.kind, self.message)
    }
}

#[derive(Debug, Error)]
pub enum RatesError {
    /// Request could not be sent, or the response could not be read.
    #[error("transport error for {date}: {message}")]
    Transport { date: NaiveDate, message: String },

    #[error("request timed out for {date}")]
    Timeout { date: NaiveDate },

    /// Body could not be decoded into the expected document structure.
    #[error("parse error: {message}")]
    Parse { message: String },

    #[error("invalid value {raw:?} for currency {code}")]
    ValueParse { code: String, raw: String },

    #[error("no observations to reduce")]
    EmptyStore,

    #[error("{} of the requested dates failed:\n{}", failures.len(), format_failures(failures))]
    Aggregation { failures: Vec<DateFailure> },

    #[error("worker pool error: {0}")]
    Runtime(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RatesError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Short, stable name of the error kind (used in failure listings).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Timeout { .. } => "timeout",
            Self::Parse { .. } => "parse",
            Self::ValueParse { .. } => "value",
            Self::EmptyStore => "empty",
            Self::Aggregation { .. } => "aggregation",
            Self::Runtime(_) => "runtime",
            Self::Config(_) => "config",
        }
    }
}

fn format_failures(failures: &[DateFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("  {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<RatesError> for AppError {
    fn from(err: RatesError) -> Self {
        let exit_code = match &err {
            RatesError::Config(_) => 2,
            RatesError::Transport { .. } | RatesError::Timeout { .. } | RatesError::Aggregation { .. } => 3,
            RatesError::Parse { .. } | RatesError::ValueParse { .. } => 4,
            RatesError::EmptyStore => 5,
            RatesError::Runtime(_) => 1,
        };
        Self::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
