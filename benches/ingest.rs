//! Benchmarks for table parsing and background field evaluation.
//!
//! Run:
//! - cargo bench --bench ingest

use std::fmt::Write as _;
use std::path::Path;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use simplot::core::field::{Grid2D, Potential, ScalarField2D};
use simplot::core::loader::parse_columns;
use simplot::core::schema::{Delimiter, SchemaDescriptor};

const ROW_COUNTS: [usize; 3] = [1_000, 10_000, 100_000];
const GRID_SIZES: [usize; 3] = [100, 200, 400];

fn make_text(rows: usize, delimiter: Delimiter) -> String {
    let sep = match delimiter {
        Delimiter::Whitespace => "  ",
        Delimiter::Comma => ",",
    };
    let mut text = String::from("# t x y z\n");
    for i in 0..rows {
        let t = i as f64 * 1e-3;
        writeln!(
            text,
            "{t:.6}{sep}{:.9}{sep}{:.9}{sep}{:.9}",
            t.sin() * 20.0,
            t.cos() * 25.0,
            (2.0 * t).sin() * 40.0 + 10.0
        )
        .unwrap();
    }
    text
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_columns");
    group.sample_size(20);

    for delimiter in [Delimiter::Whitespace, Delimiter::Comma] {
        let schema = SchemaDescriptor::new(["t", "x", "y", "z"])
            .with_skip_rows(1)
            .with_delimiter(delimiter);
        for &rows in &ROW_COUNTS {
            let text = make_text(rows, delimiter);
            let id = BenchmarkId::new(format!("{delimiter:?}"), rows);
            group.bench_with_input(id, &text, |b, text| {
                b.iter(|| {
                    let cols = parse_columns(Path::new("bench.dat"), black_box(text), &schema).unwrap();
                    black_box(cols);
                });
            });
        }
    }

    group.finish();
}

fn bench_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("annular_field");
    group.sample_size(20);

    let potential = Potential::Annular {
        center: [0.0, 0.0],
        r0: 10.0,
        sigma: 10.0,
    };
    for &n in &GRID_SIZES {
        let grid = Grid2D::square(15.0, n);
        group.bench_with_input(BenchmarkId::new("grid", n), &grid, |b, grid| {
            b.iter(|| {
                let field = ScalarField2D::from_potential(black_box(grid), &potential).unwrap();
                black_box(field);
            });
        });
    }

    group.finish();
}

criterion_group!(ingest, bench_parse, bench_field);
criterion_main!(ingest);
