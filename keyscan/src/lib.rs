pub mod aggregator;
pub mod config;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod report;
pub mod results;
pub mod search;

pub use aggregator::Aggregator;
pub use config::{EncodingMode, ScanConfig, ScanSettings, SizeLimit};
pub use errors::{ScanError, ScanResult};
pub use filters::{FileFilter, FilterDecision, SkipReason};
pub use results::{FileOutcome, MatchRecord, RunSummary, ScanOutput};
pub use search::{search, CancellationToken, ScanEngine};
