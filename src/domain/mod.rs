//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - feed data (`Snapshot`, `RawRecord`)
//! - normalized observations (`Observation`)
//! - reduction outputs (`Summary`, `Extremum`, `SeriesStats`)
//! - run configuration (`RunConfig`, `FailurePolicy`)

pub mod types;

pub use types::*;
