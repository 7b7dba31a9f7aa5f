//! Host versus device collections
//!
//! Measures generate, zip and reduce at sizes from a few work-groups up to
//! millions of elements.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use parcoll_core::{device, host};

const SIZES: [usize; 4] = [1 << 10, 1 << 14, 1 << 18, 1 << 21];

fn wave(i: usize) -> f64 {
    (i as f64 * 0.001).sin()
}

fn benchmark_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("host", size), &size, |b, &size| {
            b.iter(|| host::Collection::generate(size, wave).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("device", size), &size, |b, &size| {
            b.iter(|| device::Collection::generate(size, wave).unwrap());
        });
    }

    group.finish();
}

fn benchmark_zip(c: &mut Criterion) {
    let mut group = c.benchmark_group("zip_mul");

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));

        let ha = host::Collection::generate(size, wave).unwrap();
        let hb = host::Collection::generate(size, |i| wave(i + 1)).unwrap();
        group.bench_with_input(BenchmarkId::new("host", size), &size, |b, _| {
            b.iter(|| host::ops::mul(&ha, &hb).unwrap());
        });

        let da = device::Collection::generate(size, wave).unwrap();
        let db = device::Collection::generate(size, |i| wave(i + 1)).unwrap();
        group.bench_with_input(BenchmarkId::new("device", size), &size, |b, _| {
            b.iter(|| device::ops::mul(&da, &db).unwrap());
        });
    }

    group.finish();
}

fn benchmark_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce_sum");

    for size in SIZES {
        group.throughput(Throughput::Elements(size as u64));

        let h = host::Collection::generate(size, wave).unwrap();
        group.bench_with_input(BenchmarkId::new("host_fold", size), &size, |b, _| {
            b.iter(|| h.reduce(|x, y| x + y).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("host_tree", size), &size, |b, _| {
            b.iter(|| h.reduce_tree(|x, y| x + y).unwrap());
        });

        let d = device::Collection::generate(size, wave).unwrap();
        group.bench_with_input(BenchmarkId::new("device", size), &size, |b, _| {
            b.iter(|| d.reduce(|x, y| x + y).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_generate, benchmark_zip, benchmark_reduce);
criterion_main!(benches);
