//! Remote data: the CBR daily feed client and snapshot extraction.

pub mod cbr;
pub mod extract;

pub use cbr::{HttpFetcher, SnapshotSource, decode_document, parse_document};
pub use extract::{extract, normalize_decimal};
