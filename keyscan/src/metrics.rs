use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::filters::SkipReason;
use crate::results::FileOutcome;

/// Counters describing one scan, shared by all workers
#[derive(Debug, Clone)]
pub struct ScanStats {
    // Traversal
    files_visited: Arc<AtomicU64>,
    skipped_extension: Arc<AtomicU64>,
    skipped_size: Arc<AtomicU64>,
    skipped_unreadable: Arc<AtomicU64>,

    // Work units
    files_processed: Arc<AtomicU64>,
    files_failed: Arc<AtomicU64>,
    records_emitted: Arc<AtomicU64>,

    // Content reads
    content_scans: Arc<AtomicU64>,
    content_scans_abandoned: Arc<AtomicU64>,
    bytes_scanned: Arc<AtomicU64>,
    buffered_reads: Arc<AtomicU64>,
    mmap_reads: Arc<AtomicU64>,
}

impl ScanStats {
    pub fn new() -> Self {
        Self {
            files_visited: Arc::new(AtomicU64::new(0)),
            skipped_extension: Arc::new(AtomicU64::new(0)),
            skipped_size: Arc::new(AtomicU64::new(0)),
            skipped_unreadable: Arc::new(AtomicU64::new(0)),
            files_processed: Arc::new(AtomicU64::new(0)),
            files_failed: Arc::new(AtomicU64::new(0)),
            records_emitted: Arc::new(AtomicU64::new(0)),
            content_scans: Arc::new(AtomicU64::new(0)),
            content_scans_abandoned: Arc::new(AtomicU64::new(0)),
            bytes_scanned: Arc::new(AtomicU64::new(0)),
            buffered_reads: Arc::new(AtomicU64::new(0)),
            mmap_reads: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a file handed to the worker pool
    pub fn record_visit(&self) {
        self.files_visited.fetch_add(1, Ordering::Relaxed);
    }

    /// Records how a work unit ended
    pub fn record_outcome(&self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Processed { records } => {
                self.files_processed.fetch_add(1, Ordering::Relaxed);
                self.records_emitted
                    .fetch_add(*records as u64, Ordering::Relaxed);
            }
            FileOutcome::Skipped(reason) => {
                let counter = match reason {
                    SkipReason::Extension => &self.skipped_extension,
                    SkipReason::TooLarge { .. } => &self.skipped_size,
                    SkipReason::Unreadable(_) => &self.skipped_unreadable,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
            FileOutcome::Failed(_) => {
                self.files_failed.fetch_add(1, Ordering::Relaxed);
                self.records_emitted.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Records a file whose content was read, and how
    pub fn record_read(&self, bytes: u64, mapped: bool) {
        self.content_scans.fetch_add(1, Ordering::Relaxed);
        self.bytes_scanned.fetch_add(bytes, Ordering::Relaxed);
        if mapped {
            self.mmap_reads.fetch_add(1, Ordering::Relaxed);
        } else {
            self.buffered_reads.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a content scan that could not be started
    pub fn record_abandoned_scan(&self) {
        self.content_scans_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files_visited: self.files_visited.load(Ordering::Relaxed),
            skipped_extension: self.skipped_extension.load(Ordering::Relaxed),
            skipped_size: self.skipped_size.load(Ordering::Relaxed),
            skipped_unreadable: self.skipped_unreadable.load(Ordering::Relaxed),
            files_processed: self.files_processed.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
            content_scans: self.content_scans.load(Ordering::Relaxed),
            content_scans_abandoned: self.content_scans_abandoned.load(Ordering::Relaxed),
            bytes_scanned: self.bytes_scanned.load(Ordering::Relaxed),
            buffered_reads: self.buffered_reads.load(Ordering::Relaxed),
            mmap_reads: self.mmap_reads.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.snapshot();
        info!(
            "Scan stats:\n\
             Files visited: {}\n\
             Skipped (extension/size/unreadable): {}/{}/{}\n\
             Processed/failed: {}/{}\n\
             Records emitted: {}\n\
             Content scans (abandoned): {} ({})\n\
             Bytes scanned: {}\n\
             Reads (buffered/mmap): {}/{}",
            stats.files_visited,
            stats.skipped_extension,
            stats.skipped_size,
            stats.skipped_unreadable,
            stats.files_processed,
            stats.files_failed,
            stats.records_emitted,
            stats.content_scans,
            stats.content_scans_abandoned,
            stats.bytes_scanned,
            stats.buffered_reads,
            stats.mmap_reads
        );
    }
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`ScanStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub files_visited: u64,
    pub skipped_extension: u64,
    pub skipped_size: u64,
    pub skipped_unreadable: u64,
    pub files_processed: u64,
    pub files_failed: u64,
    pub records_emitted: u64,
    pub content_scans: u64,
    pub content_scans_abandoned: u64,
    pub bytes_scanned: u64,
    pub buffered_reads: u64,
    pub mmap_reads: u64,
}

impl StatsSnapshot {
    pub fn files_skipped(&self) -> u64 {
        self.skipped_extension + self.skipped_size + self.skipped_unreadable
    }
}
