//! Benchmarks for diffnote core operations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use diffnote::core::{parse_diff_lines, SearchIndex};

/// Generate a diff with `hunks` hunks of `lines_per_hunk` body lines each.
fn generate_diff(hunks: usize, lines_per_hunk: usize) -> String {
    let mut text = String::new();
    let mut start = 1;
    for h in 0..hunks {
        text.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            start, lines_per_hunk, start, lines_per_hunk
        ));
        for i in 0..lines_per_hunk {
            match i % 3 {
                0 => text.push_str(&format!(" context line {} in hunk {}\n", i, h)),
                1 => text.push_str(&format!("-removed line {} in hunk {}\n", i, h)),
                _ => text.push_str(&format!("+added line {} in hunk {}\n", i, h)),
            }
        }
        start += lines_per_hunk + 5;
    }
    text
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_diff_lines");

    for size in [100, 1_000, 10_000] {
        let diff = generate_diff(size / 10, 10);
        group.throughput(Throughput::Bytes(diff.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &diff, |b, diff| {
            b.iter(|| parse_diff_lines(black_box(diff)));
        });
    }

    group.finish();
}

fn bench_search_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("SearchIndex::rebuild");

    for files in [4, 16, 64] {
        let corpus: Vec<(String, String)> = (0..files)
            .map(|i| (format!("file{}.rs", i), generate_diff(10, 10)))
            .collect();

        group.throughput(Throughput::Elements(files as u64));
        group.bench_with_input(BenchmarkId::from_parameter(files), &corpus, |b, corpus| {
            let mut index = SearchIndex::new();
            b.iter(|| {
                index.rebuild(
                    black_box("line"),
                    corpus.iter().map(|(n, d)| (n.as_str(), d.as_str())),
                );
                index.total()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_search_rebuild);
criterion_main!(benches);
