use ignore::WalkBuilder;
use rayon::ThreadPoolBuilder;
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

use super::matcher::KeywordMatcher;
use super::scanner::ContentScanner;
use crate::aggregator::Aggregator;
use crate::config::ScanConfig;
use crate::errors::ScanResult;
use crate::filters::FileFilter;
use crate::metrics::ScanStats;
use crate::results::{FileOutcome, MatchRecord, RunSummary, ScanOutput};

/// Shared flag used to stop a running scan
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Walks a directory tree and scans every file on a fixed-size worker pool.
///
/// The walk runs on the calling thread; each regular file becomes one work unit
/// on a dedicated rayon pool with exactly `config.threads` workers. `run` returns
/// only after every dispatched unit has finished.
#[derive(Debug)]
pub struct ScanEngine {
    root_path: PathBuf,
    threads: usize,
    filter: FileFilter,
    scanner: ContentScanner,
    stats: ScanStats,
    cancel: CancellationToken,
}

impl ScanEngine {
    pub fn new(config: &ScanConfig) -> Self {
        let stats = ScanStats::new();
        let scanner = ContentScanner::with_stats(
            KeywordMatcher::new(config.keyword.as_str()),
            config.encoding_mode,
            stats.clone(),
        );
        Self {
            root_path: config.root_path.clone(),
            threads: config.threads.get(),
            filter: FileFilter::new(config),
            scanner,
            stats,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `token` to stop dispatching when it is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Enumerates regular files under the root, including symlinks that resolve to
    /// regular files. Links are not followed into directories, so cycles cannot
    /// occur; FIFOs, sockets and devices are never yielded.
    fn walk(&self) -> impl Iterator<Item = PathBuf> {
        WalkBuilder::new(&self.root_path)
            .standard_filters(false)
            .follow_links(false)
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| match entry.file_type() {
                Some(ft) if ft.is_file() => true,
                Some(ft) if ft.is_symlink() => fs::metadata(entry.path())
                    .map(|meta| meta.is_file())
                    .unwrap_or(false),
                _ => false,
            })
            .map(|entry| entry.into_path())
    }

    /// Runs the scan, appending records to `aggregator` as they are found
    pub fn run(&self, aggregator: &Aggregator) -> ScanResult<RunSummary> {
        self.run_units(aggregator, |path| self.process_file(path, aggregator))
    }

    /// Dispatches `unit` once per walked file and waits for all of them
    fn run_units<F>(&self, aggregator: &Aggregator, unit: F) -> ScanResult<RunSummary>
    where
        F: Fn(&Path) -> FileOutcome + Sync,
    {
        let start = Instant::now();
        info!(
            "Starting scan of {} with {} workers",
            self.root_path.display(),
            self.threads
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("keyscan-worker-{}", i))
            .build()?;

        let unit = &unit;
        pool.in_place_scope(|scope| {
            for path in self.walk() {
                if self.cancel.is_cancelled() {
                    debug!("Scan cancelled, no further files dispatched");
                    break;
                }
                self.stats.record_visit();
                scope.spawn(move |_| {
                    if self.cancel.is_cancelled() {
                        return;
                    }
                    let outcome = self.process_guarded(&path, aggregator, unit);
                    self.stats.record_outcome(&outcome);
                });
            }
        });

        let summary = RunSummary {
            elapsed: start.elapsed(),
            stats: self.stats.snapshot(),
            interrupted: self.cancel.is_cancelled(),
        };
        self.stats.log_stats();
        info!(
            "Scan complete in {:.2}s: {} records from {} files",
            summary.elapsed_secs(),
            aggregator.len(),
            summary.stats.files_visited
        );
        Ok(summary)
    }

    /// Runs one work unit, turning a panic into a diagnostic record
    fn process_guarded<F>(&self, path: &Path, aggregator: &Aggregator, unit: &F) -> FileOutcome
    where
        F: Fn(&Path) -> FileOutcome + Sync,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| unit(path))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("Work unit for {} failed: {}", path.display(), message);
                aggregator.append(MatchRecord::error(path, message.as_str()));
                FileOutcome::Failed(message)
            }
        }
    }

    /// Filters one file and scans it, appending its records as they are produced
    pub fn process_file(&self, path: &Path, aggregator: &Aggregator) -> FileOutcome {
        trace!("Processing file: {}", path.display());

        let decision = match self.filter.evaluate(path) {
            Ok(decision) => decision,
            Err(reason) => {
                debug!("Skipping {}: {}", path.display(), reason);
                return FileOutcome::Skipped(reason);
            }
        };

        let mut records = 0;
        if decision.scan_name {
            aggregator.append(MatchRecord::name_match(path));
            records += 1;
        }

        if decision.scan_content {
            match self.scanner.scan(path) {
                Ok(matches) => {
                    for position in matches {
                        aggregator.append(MatchRecord::content_match(path, position));
                        records += 1;
                    }
                }
                Err(e) => {
                    debug!("Abandoning content scan of {}: {}", path.display(), e);
                    self.stats.record_abandoned_scan();
                }
            }
        }

        FileOutcome::Processed { records }
    }
}

/// Validates `config`, runs a complete scan and returns every record with the
/// run summary
pub fn search(config: &ScanConfig) -> ScanResult<ScanOutput> {
    config.validate()?;
    let aggregator = Aggregator::new();
    let summary = ScanEngine::new(config).run(&aggregator)?;
    Ok(ScanOutput {
        records: aggregator.into_records(),
        summary,
    })
}
