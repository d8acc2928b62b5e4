use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::filters::SkipReason;
use crate::metrics::StatsSnapshot;
use crate::search::scanner::ContentMatch;

/// One line of the final report
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchRecord {
    /// The file's path contains the keyword
    NameMatch { path: PathBuf },
    /// One occurrence of the keyword in the file's text (1-based line and column)
    ContentMatch {
        path: PathBuf,
        line: usize,
        column: usize,
    },
    /// A work unit failed unexpectedly while processing the file
    ErrorMatch { path: PathBuf, message: String },
}

impl MatchRecord {
    pub fn name_match(path: impl Into<PathBuf>) -> Self {
        Self::NameMatch { path: path.into() }
    }

    pub fn content_match(path: impl Into<PathBuf>, position: ContentMatch) -> Self {
        Self::ContentMatch {
            path: path.into(),
            line: position.line,
            column: position.column,
        }
    }

    pub fn error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ErrorMatch {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::NameMatch { path }
            | Self::ContentMatch { path, .. }
            | Self::ErrorMatch { path, .. } => path,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::ErrorMatch { .. })
    }
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameMatch { path } => write!(f, "找到文件名匹配: {}", path.display()),
            Self::ContentMatch { path, line, column } => write!(
                f,
                "在文件 {} 的第 {} 行，第 {} 列找到匹配内容",
                path.display(),
                line,
                column
            ),
            Self::ErrorMatch { path, message } => {
                write!(f, "处理文件时出错: {}, 错误: {}", path.display(), message)
            }
        }
    }
}

/// How one work unit ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file passed the filter; `records` were appended for it
    Processed { records: usize },
    /// The file was filtered out and produced nothing
    Skipped(SkipReason),
    /// The unit failed; one diagnostic record was appended instead
    Failed(String),
}

/// Summary of a finished (or interrupted) run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    /// Wall-clock time from just before traversal until all work completed
    pub elapsed: Duration,
    pub stats: StatsSnapshot,
    /// The run stopped dispatching early because it was cancelled
    pub interrupted: bool,
}

impl RunSummary {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Closing line of the report
    pub fn summary_line(&self) -> String {
        format!("总共执行时间: {:.2} 秒", self.elapsed_secs())
    }
}

/// Records and summary of a complete scan
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// Records in the order they were appended
    pub records: Vec<MatchRecord>,
    pub summary: RunSummary,
}

impl ScanOutput {
    pub fn name_matches(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r, MatchRecord::NameMatch { .. }))
            .count()
    }

    pub fn content_matches(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r, MatchRecord::ContentMatch { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lines() {
        let record = MatchRecord::name_match("dir/keyfile.log");
        assert_eq!(record.to_string(), "找到文件名匹配: dir/keyfile.log");

        let record = MatchRecord::content_match("a.txt", ContentMatch { line: 2, column: 4 });
        assert_eq!(
            record.to_string(),
            "在文件 a.txt 的第 2 行，第 4 列找到匹配内容"
        );

        let record = MatchRecord::error("b.txt", "worker panicked");
        assert_eq!(
            record.to_string(),
            "处理文件时出错: b.txt, 错误: worker panicked"
        );
        assert!(record.is_error());
        assert_eq!(record.path(), Path::new("b.txt"));
    }

    #[test]
    fn test_summary_line() {
        let summary = RunSummary {
            elapsed: Duration::from_millis(1234),
            ..Default::default()
        };
        assert_eq!(summary.summary_line(), "总共执行时间: 1.23 秒");

        let summary = RunSummary::default();
        assert_eq!(summary.summary_line(), "总共执行时间: 0.00 秒");
    }

    #[test]
    fn test_output_counts() {
        let output = ScanOutput {
            records: vec![
                MatchRecord::name_match("key.txt"),
                MatchRecord::content_match("key.txt", ContentMatch { line: 1, column: 1 }),
                MatchRecord::content_match("key.txt", ContentMatch { line: 1, column: 9 }),
                MatchRecord::error("broken.txt", "boom"),
            ],
            summary: RunSummary::default(),
        };

        assert_eq!(output.name_matches(), 1);
        assert_eq!(output.content_matches(), 2);
        assert_eq!(output.records.iter().filter(|r| r.is_error()).count(), 1);
    }
}
