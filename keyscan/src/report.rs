use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{ScanError, ScanResult};
use crate::results::{MatchRecord, RunSummary};

/// Writes the report body: one line per record, a blank line, then the
/// elapsed-time summary
pub fn render<W: Write>(writer: &mut W, records: &[MatchRecord], summary: &RunSummary) -> io::Result<()> {
    for record in records {
        writeln!(writer, "{}", record)?;
    }
    writeln!(writer)?;
    writeln!(writer, "{}", summary.summary_line())?;
    writer.flush()
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Persists the report to `path`.
///
/// The report is written next to the destination first and renamed into place,
/// so an existing file is either fully replaced or left untouched.
pub fn write_report(path: &Path, records: &[MatchRecord], summary: &RunSummary) -> ScanResult<()> {
    let tmp_path = temp_path_for(path);
    debug!("Writing report to temporary file: {}", tmp_path.display());

    let result = File::create(&tmp_path)
        .map(BufWriter::new)
        .and_then(|mut writer| render(&mut writer, records, summary))
        .and_then(|_| fs::rename(&tmp_path, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(ScanError::output_error(path, e));
    }

    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::scanner::ContentMatch;
    use std::time::Duration;
    use tempfile::tempdir;

    fn sample_records() -> Vec<MatchRecord> {
        vec![
            MatchRecord::name_match("dir/keyfile.log"),
            MatchRecord::content_match("dir/notes.txt", ContentMatch { line: 2, column: 5 }),
        ]
    }

    #[test]
    fn test_render_format() {
        let summary = RunSummary {
            elapsed: Duration::from_millis(2500),
            ..Default::default()
        };
        let mut out = Vec::new();
        render(&mut out, &sample_records(), &summary).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "找到文件名匹配: dir/keyfile.log\n\
             在文件 dir/notes.txt 的第 2 行，第 5 列找到匹配内容\n\
             \n\
             总共执行时间: 2.50 秒\n"
        );
    }

    #[test]
    fn test_render_empty_report() {
        let mut out = Vec::new();
        render(&mut out, &[], &RunSummary::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\n总共执行时间: 0.00 秒\n");
    }

    #[test]
    fn test_write_report_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("search_results.txt");
        fs::write(&path, "stale contents\n").unwrap();

        write_report(&path, &sample_records(), &RunSummary::default()).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("找到文件名匹配: dir/keyfile.log\n"));
        assert!(!written.contains("stale"));
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_write_report_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("out.txt");

        let err = write_report(&path, &sample_records(), &RunSummary::default()).unwrap_err();
        assert!(matches!(err, ScanError::OutputError { .. }));
    }
}
