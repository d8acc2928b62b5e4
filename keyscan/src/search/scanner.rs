use memmap2::Mmap;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::trace;

use super::lines::split_line;
use super::matcher::KeywordMatcher;
use crate::config::EncodingMode;
use crate::errors::{ScanError, ScanResult};
use crate::metrics::ScanStats;

/// Files at least this large are memory-mapped instead of read into a buffer
pub(crate) const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

/// Position of one keyword occurrence inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentMatch {
    /// 1-based line number
    pub line: usize,
    /// 1-based character column of the match start
    pub column: usize,
}

/// Decodes bytes as UTF-8. Never fails: invalid sequences are dropped or
/// replaced depending on `mode`. Valid input is borrowed, not copied.
pub fn decode_bytes(bytes: &[u8], mode: EncodingMode) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(valid) => Cow::Borrowed(valid),
        Err(_) => match mode {
            EncodingMode::Replace => String::from_utf8_lossy(bytes),
            EncodingMode::Ignore => Cow::Owned(bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()),
        },
    }
}

/// Finds keyword occurrences in file contents
#[derive(Debug, Clone)]
pub struct ContentScanner {
    matcher: KeywordMatcher,
    encoding_mode: EncodingMode,
    stats: ScanStats,
}

impl ContentScanner {
    pub fn new(matcher: KeywordMatcher, encoding_mode: EncodingMode) -> Self {
        Self::with_stats(matcher, encoding_mode, ScanStats::new())
    }

    /// Creates a scanner that reports its reads to `stats`
    pub fn with_stats(matcher: KeywordMatcher, encoding_mode: EncodingMode, stats: ScanStats) -> Self {
        Self {
            matcher,
            encoding_mode,
            stats,
        }
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Opens `path` and returns a lazy iterator over its matches.
    ///
    /// Only regular files are read; FIFOs, sockets and devices are refused before
    /// they are opened. Small files are read into a buffer, large ones are
    /// memory-mapped. Both are split and decoded line by line, so they yield
    /// identical matches.
    pub fn scan(&self, path: &Path) -> ScanResult<ContentMatches> {
        trace!("Scanning content of: {}", path.display());

        let metadata = fs::metadata(path).map_err(|e| ScanError::from_io(path, e))?;
        if !metadata.is_file() {
            return Err(ScanError::not_a_file(path));
        }
        let size = metadata.len();
        let mut file = File::open(path).map_err(|e| ScanError::from_io(path, e))?;

        let source = if size >= MMAP_THRESHOLD {
            let mmap = unsafe { Mmap::map(&file) }.map_err(ScanError::IoError)?;
            self.stats.record_read(mmap.len() as u64, true);
            Source::Mapped(mmap)
        } else {
            let mut bytes = Vec::with_capacity(size as usize);
            file.read_to_end(&mut bytes)
                .map_err(|e| ScanError::from_io(path, e))?;
            self.stats.record_read(bytes.len() as u64, false);
            Source::Buffered(bytes)
        };
        Ok(self.matches_in(source))
    }

    /// Returns a lazy iterator over the matches in already decoded text
    pub fn scan_text(&self, text: impl Into<String>) -> ContentMatches {
        self.matches_in(Source::Buffered(text.into().into_bytes()))
    }

    fn matches_in(&self, source: Source) -> ContentMatches {
        ContentMatches {
            matcher: self.matcher.clone(),
            encoding_mode: self.encoding_mode,
            source,
            offset: 0,
            line: 0,
            pending: VecDeque::new(),
            scratch: Vec::new(),
        }
    }
}

/// Raw file contents, owned or mapped
#[derive(Debug)]
enum Source {
    Buffered(Vec<u8>),
    Mapped(Mmap),
}

impl Source {
    fn bytes(&self) -> &[u8] {
        match self {
            Source::Buffered(bytes) => bytes,
            Source::Mapped(mmap) => mmap,
        }
    }
}

/// Lazy sequence of matches, in line then column order.
///
/// Owns the file bytes; lines are split, decoded and searched only as the
/// iterator is advanced.
#[derive(Debug)]
pub struct ContentMatches {
    matcher: KeywordMatcher,
    encoding_mode: EncodingMode,
    source: Source,
    offset: usize,
    line: usize,
    pending: VecDeque<usize>,
    scratch: Vec<char>,
}

impl Iterator for ContentMatches {
    type Item = ContentMatch;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(column) = self.pending.pop_front() {
                return Some(ContentMatch {
                    line: self.line,
                    column,
                });
            }
            let bytes = self.source.bytes();
            if self.offset >= bytes.len() {
                return None;
            }

            let (raw, consumed) = split_line(&bytes[self.offset..]);
            let line = decode_bytes(raw, self.encoding_mode);
            self.line += 1;
            self.matcher
                .collect_columns(&line, &mut self.scratch, &mut self.pending);
            self.offset += consumed;
        }
    }
}
