use std::fmt;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::results::MatchRecord;

struct Inner {
    records: Vec<MatchRecord>,
    echo: Option<Box<dyn Write + Send>>,
}

/// Collects match records from all workers of one run.
///
/// Appends are serialized by a mutex, so records never interleave or get lost and
/// their order is the order in which workers appended them. When an echo writer
/// is attached, each record's report line is written to it inside the same
/// critical section, so the echoed order matches the stored order.
pub struct Aggregator {
    inner: Mutex<Inner>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: Vec::new(),
                echo: None,
            }),
        }
    }

    /// Creates an aggregator that mirrors every appended record to `writer`
    pub fn with_echo<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: Vec::new(),
                echo: Some(Box::new(writer)),
            }),
        }
    }

    // A worker that panicked mid-append cannot leave the vector half-written,
    // so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends one record
    pub fn append(&self, record: MatchRecord) {
        let mut inner = self.lock();
        if let Some(echo) = inner.echo.as_mut() {
            if let Err(e) = writeln!(echo, "{}", record).and_then(|_| echo.flush()) {
                debug!("Failed to echo record: {}", e);
            }
        }
        inner.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the records appended so far
    pub fn snapshot(&self) -> Vec<MatchRecord> {
        self.lock().records.clone()
    }

    /// Takes every record appended so far, leaving the aggregator empty.
    /// Meant to be called once the run has finished.
    pub fn drain(&self) -> Vec<MatchRecord> {
        std::mem::take(&mut self.lock().records)
    }

    /// Consumes the aggregator and returns the records in append order
    pub fn into_records(self) -> Vec<MatchRecord> {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .records
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Aggregator")
            .field("records", &inner.records.len())
            .field("echo", &inner.echo.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::scanner::ContentMatch;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_append_preserves_order() {
        let aggregator = Aggregator::new();
        aggregator.append(MatchRecord::name_match("a"));
        aggregator.append(MatchRecord::name_match("b"));
        assert_eq!(aggregator.len(), 2);

        let records = aggregator.into_records();
        assert_eq!(records[0].path().to_str(), Some("a"));
        assert_eq!(records[1].path().to_str(), Some("b"));
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let aggregator = Aggregator::new();

        thread::scope(|scope| {
            for worker in 0..8 {
                let aggregator = &aggregator;
                scope.spawn(move || {
                    for line in 1..=250 {
                        aggregator.append(MatchRecord::content_match(
                            format!("file_{}.txt", worker),
                            ContentMatch { line, column: 1 },
                        ));
                    }
                });
            }
        });

        let records = aggregator.into_records();
        assert_eq!(records.len(), 2000);
        let unique: HashSet<_> = records.iter().collect();
        assert_eq!(unique.len(), 2000);

        // each worker's own records stay in the order it appended them
        for worker in 0..8 {
            let name = format!("file_{}.txt", worker);
            let lines: Vec<usize> = records
                .iter()
                .filter_map(|r| match r {
                    MatchRecord::ContentMatch { path, line, .. } if path.to_str() == Some(name.as_str()) => {
                        Some(*line)
                    }
                    _ => None,
                })
                .collect();
            assert_eq!(lines, (1..=250).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_drain_empties_aggregator() {
        let aggregator = Aggregator::new();
        aggregator.append(MatchRecord::name_match("a"));
        aggregator.append(MatchRecord::error("b", "boom"));

        let drained = aggregator.drain();
        assert_eq!(drained.len(), 2);
        assert!(drained[1].is_error());
        assert!(aggregator.is_empty());
        assert!(aggregator.drain().is_empty());
    }

    #[test]
    fn test_echo_mirrors_records() {
        let buffer = SharedBuffer::default();
        let aggregator = Aggregator::with_echo(buffer.clone());
        aggregator.append(MatchRecord::name_match("keyfile.log"));
        aggregator.append(MatchRecord::content_match(
            "notes.txt",
            ContentMatch { line: 3, column: 7 },
        ));

        let echoed = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert_eq!(
            echoed,
            "找到文件名匹配: keyfile.log\n在文件 notes.txt 的第 3 行，第 7 列找到匹配内容\n"
        );
        assert_eq!(aggregator.snapshot().len(), 2);
    }
}
