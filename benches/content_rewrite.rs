//! Benchmarks for blob and path rewriting.
//!
//! Content rewriting runs once per distinct blob of every imported tree, so
//! its cost dominates imports of large projects.

use cookie_backport::escape::escape;
use cookie_backport::path::PathRewriter;
use cookie_backport::rewrite::ContentRewriter;
use cookie_backport::variables::VariableTable;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

const ROOT: &str = "{{cookiecutter.project_name}}";

fn table() -> VariableTable {
    VariableTable::from_pairs([
        ("project_name", "hypermodern-python"),
        ("package_name", "hypermodern_python"),
        ("friendly_name", "Hypermodern Python"),
        ("author", "Jane Developer"),
        ("email", "jane@example.com"),
        ("github_user", "jane"),
        ("version", "0.1.0"),
        ("license", "MIT"),
    ])
    .unwrap()
}

/// A workflow file mixing variable values with GitHub Actions expressions.
fn workflow(lines: usize) -> Vec<u8> {
    let mut text = String::new();
    for i in 0..lines {
        match i % 4 {
            0 => text.push_str("      - uses: actions/checkout@v4\n"),
            1 => text.push_str("        run: nox --python=${{ matrix.python }} -s tests\n"),
            2 => text.push_str("      - name: Build hypermodern-python by jane\n"),
            _ => text.push_str("        path: src/hypermodern_python/__init__.py\n"),
        }
    }
    text.into_bytes()
}

fn bench_content(c: &mut Criterion) {
    let table = table();
    let rewriter = ContentRewriter::new(&table);
    let mut group = c.benchmark_group("content_rewrite");

    for lines in [10, 1_000] {
        let data = workflow(lines);
        group.throughput(Throughput::Bytes(data.len() as u64));

        group.bench_function(format!("escape_{lines}_lines"), |b| {
            b.iter(|| escape(black_box(&data)))
        });

        group.bench_function(format!("rewrite_{lines}_lines"), |b| {
            b.iter(|| rewriter.rewrite(black_box(&data)))
        });
    }

    // Text without values or delimiters: the common case for most blobs.
    let plain = "lorem ipsum dolor sit amet\n".repeat(500).into_bytes();
    group.throughput(Throughput::Bytes(plain.len() as u64));
    group.bench_function("rewrite_plain_text", |b| {
        b.iter(|| rewriter.rewrite(black_box(&plain)))
    });

    let mut binary = vec![0u8; 64 * 1024];
    binary[100] = 0x89;
    group.throughput(Throughput::Bytes(binary.len() as u64));
    group.bench_function("rewrite_binary", |b| {
        b.iter(|| rewriter.rewrite(black_box(&binary)))
    });

    group.finish();
}

fn bench_paths(c: &mut Criterion) {
    let table = table();
    let paths = PathRewriter::new(&table, ROOT);
    let mut group = c.benchmark_group("path_rewrite");

    group.bench_function("with_value", |b| {
        b.iter(|| paths.rewrite(black_box("src/hypermodern_python/__main__.py")))
    });

    group.bench_function("without_value", |b| {
        b.iter(|| paths.rewrite(black_box(".github/workflows/tests.yml")))
    });

    group.finish();
}

criterion_group!(benches, bench_content, bench_paths);
criterion_main!(benches);
