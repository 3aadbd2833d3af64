use std::fs;
use std::hint::black_box;
use std::path::Path;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use memsweep::format::render_cleanup_report;
use memsweep::system::cleanup::clean_directory;
use tempfile::TempDir;

fn make_scratch(files: usize) -> TempDir {
    let dir = tempfile::tempdir().expect("bench scratch dir");
    populate(dir.path(), files);
    dir
}

fn populate(root: &Path, files: usize) {
    for i in 0..files {
        fs::write(root.join(format!("item_{i:05}.tmp")), b"scratch").expect("bench file");
    }
    let nested = root.join("cache").join("nested");
    fs::create_dir_all(&nested).expect("bench dir");
    for i in 0..files / 10 {
        fs::write(nested.join(format!("blob_{i:05}.bin")), b"blob").expect("bench file");
    }
}

fn bench_clean_directory(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean_directory_100_500_2000");

    for &n in &[100usize, 500, 2000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || make_scratch(n),
                |scratch| {
                    let report = clean_directory(scratch.path(), |p| {
                        black_box(p);
                    })
                    .expect("bench cleanup failed");
                    black_box(report);
                },
                BatchSize::PerIteration,
            )
        });
    }

    group.finish();
}

fn bench_render_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_cleanup_report_500_2000");

    for &n in &[500usize, 2000] {
        let scratch = make_scratch(n);
        let report = clean_directory(scratch.path(), |_| {}).expect("bench cleanup failed");
        group.bench_with_input(BenchmarkId::from_parameter(n), &report, |b, report| {
            b.iter(|| black_box(render_cleanup_report(black_box(report))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_clean_directory, bench_render_report);
criterion_main!(benches);
