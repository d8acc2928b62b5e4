//! Traversal, matching and content scanning.
//!
//! [`engine`] walks the tree and dispatches one work unit per file to a worker
//! pool, [`scanner`] produces line/column matches for a single file, and
//! [`matcher`] holds the literal case-insensitive comparison both name and
//! content checks share.
pub mod engine;
pub mod lines;
pub mod matcher;
pub mod scanner;

pub use engine::{search, CancellationToken, ScanEngine};
pub use matcher::KeywordMatcher;
pub use scanner::{ContentMatch, ContentMatches, ContentScanner};
