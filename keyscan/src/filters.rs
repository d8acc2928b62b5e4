/// File eligibility rules.
///
/// A file is considered only when its path ends with one of the allowed suffixes
/// (if any are configured) and its size is within the configured limit. Eligible
/// files always get a name check; their content is scanned only when content
/// scanning is enabled, regardless of whether the name matched.
use std::fmt;
use std::path::Path;

use crate::config::{ScanConfig, SizeLimit};
use crate::search::matcher::KeywordMatcher;

/// What to do with a file that passed the filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterDecision {
    /// The path contains the keyword; emit a name match
    pub scan_name: bool,
    /// Run the content scanner on this file
    pub scan_content: bool,
}

impl FilterDecision {
    /// Decision for a file that produces no records
    pub const SKIP: FilterDecision = FilterDecision {
        scan_name: false,
        scan_content: false,
    };

    pub fn is_skip(&self) -> bool {
        !self.scan_name && !self.scan_content
    }
}

/// Why a file was left out of the scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The path does not end with an allowed suffix
    Extension,
    /// The file is larger than the configured limit
    TooLarge { size: u64, limit: u64 },
    /// The size could not be determined (vanished, permission denied, ...)
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Extension => write!(f, "extension not allowed"),
            SkipReason::TooLarge { size, limit } => {
                write!(f, "size {} exceeds limit {}", size, limit)
            }
            SkipReason::Unreadable(msg) => write!(f, "unreadable: {}", msg),
        }
    }
}

/// Checks the path against the allowed suffixes (case-sensitive).
/// An empty list allows every path.
pub fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    let path_str = path.to_string_lossy();
    extensions.iter().any(|ext| path_str.ends_with(ext.as_str()))
}

/// Checks the file size against `limit`. No stat is made for an unbounded limit.
pub fn check_size(path: &Path, limit: SizeLimit) -> Result<(), SkipReason> {
    let SizeLimit::Bytes(max) = limit else {
        return Ok(());
    };
    let size = std::fs::metadata(path)
        .map_err(|e| SkipReason::Unreadable(e.to_string()))?
        .len();
    if limit.permits(size) {
        Ok(())
    } else {
        Err(SkipReason::TooLarge { size, limit: max })
    }
}

/// Per-file eligibility and name matching for one scan
#[derive(Debug, Clone)]
pub struct FileFilter {
    matcher: KeywordMatcher,
    allowed_extensions: Vec<String>,
    max_file_size: SizeLimit,
    read_content: bool,
}

impl FileFilter {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            matcher: KeywordMatcher::new(config.keyword.as_str()),
            allowed_extensions: config.allowed_extensions.clone(),
            max_file_size: config.max_file_size,
            read_content: config.read_content,
        }
    }

    /// Decides what to do with `path`, or why it is skipped
    pub fn evaluate(&self, path: &Path) -> Result<FilterDecision, SkipReason> {
        if !has_allowed_extension(path, &self.allowed_extensions) {
            return Err(SkipReason::Extension);
        }
        check_size(path, self.max_file_size)?;

        Ok(FilterDecision {
            scan_name: self.matcher.is_match(&path.to_string_lossy()),
            scan_content: self.read_content,
        })
    }

    /// Same as [`FileFilter::evaluate`] with skipped files mapped to
    /// [`FilterDecision::SKIP`]
    pub fn accepts(&self, path: &Path) -> FilterDecision {
        self.evaluate(path).unwrap_or(FilterDecision::SKIP)
    }
}
