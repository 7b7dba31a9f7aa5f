//! `parcoll perf`: generate two random collections, multiply them
//! elementwise and sum the product, timing each phase.

use std::path::Path;

use anyhow::{Context, Result};
use parcoll_core::{device, host};
use parcoll_tracing::timed_block;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::cli::BackendChoice;

const NS_PER_MS: f64 = 1e-6;

/// One CSV row. Times are in milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct PerfRecord {
    pub backend: &'static str,
    pub size: usize,
    pub value: f64,
    pub gen_time_1: f64,
    pub gen_time_2: f64,
    pub zip_time: f64,
    pub reduce_time: f64,
}

pub fn run(output: &Path, sizes: &[usize], backend: BackendChoice, seed: Option<u64>) -> Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    tracing::info!(seed, sizes = ?sizes, ?backend, "starting perf run");

    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::new();
    for &size in sizes {
        if backend.host() {
            let record = run_host(size, &mut rng).with_context(|| format!("host run of size {size}"))?;
            report(&record);
            records.push(record);
        }
        if backend.device() {
            let record = run_device(size, seed).with_context(|| format!("device run of size {size}"))?;
            report(&record);
            records.push(record);
        }
    }

    write_results(output, &records)?;
    tracing::info!(path = %output.display(), rows = records.len(), "perf results written");
    Ok(())
}

fn run_host(size: usize, rng: &mut StdRng) -> Result<PerfRecord> {
    let (u, gen_1) = timed_block!("host_generate", { host::Collection::generate(size, |_| rng.gen::<f64>()) });
    let u = u?;
    let (v, gen_2) = timed_block!("host_generate", { host::Collection::generate(size, |_| rng.gen::<f64>()) });
    let v = v?;
    let (w, zip) = timed_block!("host_zip", { host::ops::mul(&u, &v) });
    let w = w?;
    let (value, reduce) = timed_block!("host_sum", { host::ops::sum(&w) });

    Ok(PerfRecord {
        backend: "host",
        size,
        value: value?,
        gen_time_1: gen_1 as f64 * NS_PER_MS,
        gen_time_2: gen_2 as f64 * NS_PER_MS,
        zip_time: zip as f64 * NS_PER_MS,
        reduce_time: reduce as f64 * NS_PER_MS,
    })
}

fn run_device(size: usize, seed: u64) -> Result<PerfRecord> {
    let second = seed.wrapping_add(1);
    let (u, gen_1) = timed_block!("device_generate", {
        device::Collection::generate(size, move |i| unit_interval(seed, i))
    });
    let u = u?;
    let (v, gen_2) = timed_block!("device_generate", {
        device::Collection::generate(size, move |i| unit_interval(second, i))
    });
    let v = v?;
    let (w, zip) = timed_block!("device_zip", { device::ops::mul(&u, &v) });
    let w = w?;
    let (value, reduce) = timed_block!("device_sum", { device::ops::sum(&w) });

    Ok(PerfRecord {
        backend: "device",
        size,
        value: value?,
        gen_time_1: gen_1 as f64 * NS_PER_MS,
        gen_time_2: gen_2 as f64 * NS_PER_MS,
        zip_time: zip as f64 * NS_PER_MS,
        reduce_time: reduce as f64 * NS_PER_MS,
    })
}

/// Uniform value in `[0, 1)` derived from `(seed, index)` alone, so work
/// units need no shared generator state.
fn unit_interval(seed: u64, index: usize) -> f64 {
    let mut z = seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}

fn report(record: &PerfRecord) {
    println!("******************");
    println!("backend: {}", record.backend);
    println!("size: {}", record.size);
    println!("value: {}", record.value);
    println!("gen_time_1 (ms): {:.6}", record.gen_time_1);
    println!("gen_time_2 (ms): {:.6}", record.gen_time_2);
    println!("zip_time (ms): {:.6}", record.zip_time);
    println!("reduce_time (ms): {:.6}", record.reduce_time);
    println!("******************");
}

fn write_results(output: &Path, records: &[PerfRecord]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(output).with_context(|| format!("cannot open {}", output.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_interval_is_in_range_and_deterministic() {
        for i in 0..10_000 {
            let x = unit_interval(42, i);
            assert!((0.0..1.0).contains(&x));
        }
        assert_eq!(unit_interval(7, 3), unit_interval(7, 3));
        assert_ne!(unit_interval(7, 3), unit_interval(8, 3));
    }

    #[test]
    fn host_and_device_runs_report_sizes() {
        let mut rng = StdRng::seed_from_u64(1);
        let host = run_host(1000, &mut rng).unwrap();
        let device = run_device(1000, 1).unwrap();

        assert_eq!(host.size, 1000);
        assert_eq!(device.backend, "device");
        // Mean of a product of two U(0,1) draws is 1/4.
        assert!((host.value / 1000.0 - 0.25).abs() < 0.05);
        assert!((device.value / 1000.0 - 0.25).abs() < 0.05);
    }

    #[test]
    fn writes_csv_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perf.csv");
        run(&path, &[16, 32], BackendChoice::Both, Some(5)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("backend,size,value,gen_time_1,gen_time_2,zip_time,reduce_time")
        );
        let backends: Vec<&str> = lines.map(|l| l.split(',').next().unwrap()).collect();
        assert_eq!(backends, vec!["host", "device", "host", "device"]);
    }
}
