//! `cbr-rates` library crate.
//!
//! The binary (`rates`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes or hitting the network
//! - the feed client, store and reducer can be reused on their own

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod report;
pub mod store;
