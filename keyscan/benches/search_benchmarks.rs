use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use keyscan::search::{ContentScanner, KeywordMatcher};
use keyscan::{search, EncodingMode, ScanConfig};
use std::{fs::File, io::Write, num::NonZeroUsize};
use tempfile::tempdir;

fn create_test_files(
    dir: &tempfile::TempDir,
    file_count: usize,
    lines_per_file: usize,
) -> std::io::Result<()> {
    for i in 0..file_count {
        let file_path = dir.path().join(format!("test_{}.txt", i));
        let mut file = File::create(file_path)?;
        for j in 0..lines_per_file {
            writeln!(
                file,
                "Line {} TODO: fix bug {} FIXME: optimize line {} NOTE: important task {}",
                j, j, j, j
            )?;
        }
    }
    Ok(())
}

fn create_base_config(dir: &tempfile::TempDir, keyword: &str) -> ScanConfig {
    let mut config = ScanConfig::new(dir.path(), keyword);
    config.read_content = true;
    config.threads = NonZeroUsize::new(4).unwrap();
    config
}

fn bench_file_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("File Scaling");
    for file_count in [1, 10, 100, 1000] {
        let dir = tempdir().unwrap();
        create_test_files(&dir, file_count, 10).unwrap();
        let config = create_base_config(&dir, "todo");

        group.bench_with_input(
            BenchmarkId::from_parameter(file_count),
            &config,
            |b, config| b.iter(|| black_box(search(config).unwrap())),
        );
    }
    group.finish();
}

fn bench_thread_counts(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    create_test_files(&dir, 200, 100).unwrap();

    let mut group = c.benchmark_group("Thread Count");
    for threads in [1, 2, 4, 10] {
        let mut config = create_base_config(&dir, "fixme");
        config.threads = NonZeroUsize::new(threads).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(threads), &config, |b, config| {
            b.iter(|| black_box(search(config).unwrap()))
        });
    }
    group.finish();
}

fn bench_large_file(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    create_test_files(&dir, 1, 50_000).unwrap();
    let path = dir.path().join("test_0.txt");

    let mut group = c.benchmark_group("Large File");
    for keyword in ["TODO", "important task", "not present"] {
        let scanner = ContentScanner::new(KeywordMatcher::new(keyword), EncodingMode::Ignore);
        group.bench_function(keyword, |b| {
            b.iter(|| black_box(scanner.scan(&path).unwrap().count()))
        });
    }
    group.finish();
}

fn bench_unicode_lines(c: &mut Criterion) {
    let text = "Ünïcödé KEY straße ǅ\u{2028}".repeat(20_000);
    let scanner = ContentScanner::new(KeywordMatcher::new("straße"), EncodingMode::Ignore);

    c.bench_function("unicode_lines", |b| {
        b.iter(|| black_box(scanner.scan_text(black_box(&text)).count()))
    });
}

criterion_group!(
    benches,
    bench_file_scaling,
    bench_thread_counts,
    bench_large_file,
    bench_unicode_lines
);
criterion_main!(benches);
