//! Benchmarks for simulation output parsing and statistics.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic log files and evolution tables.

use std::path::Path;

use bigplanet::extract::stats;
use bigplanet::model::{Aggregation, KeyFilter, SimData};
use bigplanet::process::{parse_log, parse_table};
use bigplanet::store::fletcher32;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Creates a log file with the given number of bodies.
fn create_test_log(bodies: usize) -> String {
    let mut content = String::from("---- INITIAL SYSTEM PROPERTIES ----\n(Age) System Age [sec]: 0.0\n");
    for phase in ["INITIAL", "FINAL"] {
        if phase == "FINAL" {
            content.push_str("---- FINAL SYSTEM PROPERTIES ----\n");
        }
        for body in 0..bodies {
            content.push_str(&format!("----- BODY: body{} ----\n", body));
            for param in 0..40 {
                content.push_str(&format!(
                    "(Param{}) Parameter number {} [kg]: {}.5e+10\n",
                    param, param, body
                ));
            }
            content.push_str("Output Order: Time[year] TMan[K] TCore[K] Obliquity[rad]\n");
        }
    }
    content
}

/// Creates an evolution table with the given number of rows.
fn create_test_table(rows: usize) -> String {
    (0..rows)
        .map(|i| format!("{} {} {} {}\n", i, 3000.0 - i as f64, 5000.0 - i as f64, 0.41))
        .collect()
}

fn bench_log_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_parsing");

    for bodies in [1, 4, 16].iter() {
        let log = create_test_log(*bodies);
        group.bench_function(format!("{}_bodies", bodies), |b| {
            b.iter(|| {
                let mut data = SimData::new();
                parse_log(black_box(&log), &mut data, &KeyFilter::All);
                data
            });
        });
    }

    group.finish();
}

fn bench_table_parsing(c: &mut Criterion) {
    let table = create_test_table(10_000);
    c.bench_function("forward_table_10k_rows", |b| {
        b.iter(|| parse_table(black_box(&table), Path::new("bench.forward")).unwrap());
    });
}

fn bench_statistics(c: &mut Criterion) {
    let values: Vec<f64> = (0..100_000).map(|i| (i % 977) as f64 + 0.5).collect();
    let mut group = c.benchmark_group("statistics");

    for aggregation in Aggregation::STATISTICS {
        group.bench_function(aggregation.as_str(), |b| {
            b.iter(|| stats::compute(aggregation, black_box(&values)));
        });
    }

    group.finish();
}

fn bench_fletcher32(c: &mut Criterion) {
    let payload = vec![0xA5u8; 1 << 20];
    c.bench_function("fletcher32_1mb", |b| {
        b.iter(|| fletcher32(black_box(&payload)));
    });
}

criterion_group!(
    benches,
    bench_log_parsing,
    bench_table_parsing,
    bench_statistics,
    bench_fletcher32,
);
criterion_main!(benches);
