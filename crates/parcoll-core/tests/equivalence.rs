//! Host and device backends must agree: exactly for integers, within a
//! relative tolerance for floating point sums and products.

use parcoll_core::{device, host, Device, DeviceConfig, Error};
use proptest::prelude::*;
use std::sync::Arc;

fn fib(n: usize) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        (a, b) = (b, a + b);
    }
    a
}

fn fact(n: usize) -> u64 {
    (1..=n as u64).product()
}

fn small_device() -> Arc<Device> {
    Device::new(DeviceConfig::default().with_work_group_size(8).with_worker_threads(4)).unwrap()
}

fn assert_close(a: f64, b: f64) {
    let scale = a.abs().max(b.abs()).max(1.0);
    assert!((a - b).abs() / scale < 1e-9, "{a} vs {b}");
}

#[test]
fn fibonacci_and_factorial_scenario() -> parcoll_core::Result<()> {
    let host_fib = host::Collection::generate(10, fib)?;
    let host_fact = host::Collection::generate(10, fact)?;
    let dev_fib = device::Collection::generate(10, fib)?;
    let dev_fact = device::Collection::generate(10, fact)?;

    assert_eq!(host_fib.to_vector(), vec![0, 1, 1, 2, 3, 5, 8, 13, 21, 34]);
    assert_eq!(
        dev_fact.to_vector(),
        vec![1, 1, 2, 6, 24, 120, 720, 5040, 40320, 362880]
    );

    assert_eq!(host::ops::sum(&host_fact)?, 409114);
    assert_eq!(device::ops::sum(&dev_fact)?, 409114);
    assert_eq!(host::ops::dot(&host_fib, &host_fact)?, device::ops::dot(&dev_fib, &dev_fact)?);

    let host_fib_f = host_fib.map(|x| x as f64)?;
    let host_fact_f = host_fact.map(|x| x as f64)?;
    let dev_fib_f = dev_fib.map(|x| x as f64)?;
    let dev_fact_f = dev_fact.map(|x| x as f64)?;
    assert_close(
        host::ops::dot(&host_fib_f, &host_fact_f)?,
        device::ops::dot(&dev_fib_f, &dev_fact_f)?,
    );
    Ok(())
}

#[test]
fn odd_size_reduction() -> parcoll_core::Result<()> {
    let values = [1i32, 2, 3, 4, 5];
    let device = small_device();
    assert_eq!(host::Collection::from_slice(&values)?.reduce(|a, b| a + b)?, 15);
    assert_eq!(
        device::Collection::from_slice_on(&device, &values)?.reduce(|a, b| a + b)?,
        15
    );
    Ok(())
}

#[test]
fn dot_with_all_ones_is_sum() -> parcoll_core::Result<()> {
    let device = small_device();
    let u = device::Collection::from_slice_on(&device, &[1i64, 2, 3, 4])?;
    let ones = device::Collection::generate_on(&device, 4, |_| 1i64)?;
    assert_eq!(device::ops::dot(&u, &ones)?, 10);
    assert_eq!(device::ops::sum(&u)?, 10);
    Ok(())
}

#[test]
fn bounds_at_the_edge() -> parcoll_core::Result<()> {
    let device = small_device();
    let mut h = host::Collection::generate(4, |i| i as u32)?;
    let mut d = device::Collection::generate_on(&device, 4, |i| i as u32)?;

    assert_eq!(h.get(3)?, 3);
    assert_eq!(d.get(3)?, 3);
    h.set(3, 30)?;
    d.set(3, 30)?;
    assert_eq!(h.to_vector(), d.to_vector());

    for result in [h.get(4), d.get(4)] {
        assert!(matches!(result, Err(Error::OutOfBounds { index: 4, size: 4, .. })));
    }
    assert!(h.set(4, 0).is_err());
    assert!(d.set(4, 0).is_err());
    Ok(())
}

#[test]
fn empty_reduction_is_consistent() -> parcoll_core::Result<()> {
    let device = small_device();
    let h = host::Collection::<f64>::generate(0, |_| 0.0)?;
    let d = device::Collection::<f64>::generate_on(&device, 0, |_| 0.0)?;

    assert!(matches!(h.reduce(|a, b| a + b), Err(Error::EmptyReduction)));
    assert!(matches!(d.reduce(|a, b| a + b), Err(Error::EmptyReduction)));
    assert_eq!(host::ops::sum(&h)?, device::ops::sum(&d)?);
    assert_eq!(host::ops::prod(&h)?, device::ops::prod(&d)?);
    Ok(())
}

#[test]
fn large_float_sum_within_tolerance() -> parcoll_core::Result<()> {
    let n = 100_003;
    let term = |i: usize| 1.0 / (i as f64 + 1.0);
    let h = host::Collection::generate(n, term)?;
    let d = device::Collection::generate(n, term)?;

    assert_close(host::ops::sum(&h)?, device::ops::sum(&d)?);
    assert_close(h.reduce_tree(|a, b| a + b)?, d.reduce(|a, b| a + b)?);
    Ok(())
}

#[test]
fn tree_order_is_bit_identical_across_backends() -> parcoll_core::Result<()> {
    let term = |i: usize| (i as f64).sin() * 1e6;
    let h = host::Collection::generate(4097, term)?;
    let d = device::Collection::generate_on(&small_device(), 4097, term)?;
    assert_eq!(
        h.reduce_tree(|a, b| a + b)?.to_bits(),
        d.reduce(|a, b| a + b)?.to_bits()
    );
    Ok(())
}

#[test]
fn display_matches() -> parcoll_core::Result<()> {
    let h = host::Collection::generate(3, |i| i as i16 - 1)?;
    let d = device::Collection::generate(3, |i| i as i16 - 1)?;
    assert_eq!(h.to_string(), "[-1,0,1]");
    assert_eq!(h.to_string(), d.to_string());
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Add), Just(Op::Sub), Just(Op::Mul), Just(Op::Div)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn integer_zip_ops_agree(
        pairs in proptest::collection::vec((-10_000i64..10_000, 1i64..10_000), 0..600),
        op in op_strategy(),
    ) {
        let device = small_device();
        let (xs, ys): (Vec<i64>, Vec<i64>) = pairs.into_iter().unzip();

        let ha = host::Collection::from_slice(&xs).unwrap();
        let hb = host::Collection::from_slice(&ys).unwrap();
        let da = device::Collection::from_slice_on(&device, &xs).unwrap();
        let db = device::Collection::from_slice_on(&device, &ys).unwrap();

        let (h, d) = match op {
            Op::Add => (host::ops::add(&ha, &hb), device::ops::add(&da, &db)),
            Op::Sub => (host::ops::sub(&ha, &hb), device::ops::sub(&da, &db)),
            Op::Mul => (host::ops::mul(&ha, &hb), device::ops::mul(&da, &db)),
            Op::Div => (host::ops::div(&ha, &hb), device::ops::div(&da, &db)),
        };
        prop_assert_eq!(h.unwrap().to_vector(), d.unwrap().to_vector());
    }

    #[test]
    fn integer_reductions_agree(values in proptest::collection::vec(-1000i64..1000, 1..2000)) {
        let device = small_device();
        let h = host::Collection::from_slice(&values).unwrap();
        let d = device::Collection::from_slice_on(&device, &values).unwrap();

        prop_assert_eq!(h.reduce(|a, b| a + b).unwrap(), d.reduce(|a, b| a + b).unwrap());
        prop_assert_eq!(h.reduce(i64::max).unwrap(), d.reduce(i64::max).unwrap());
        prop_assert_eq!(h.reduce(i64::min).unwrap(), d.reduce(i64::min).unwrap());
    }

    #[test]
    fn result_sizes(a in 0usize..300, b in 0usize..300) {
        let device = small_device();
        let ha = host::Collection::generate(a, |i| i as u32).unwrap();
        let hb = host::Collection::generate(b, |i| i as u32).unwrap();
        let da = device::Collection::generate_on(&device, a, |i| i as u32).unwrap();
        let db = device::Collection::generate_on(&device, b, |i| i as u32).unwrap();

        prop_assert_eq!(ha.len(), a);
        prop_assert_eq!(da.len(), a);
        prop_assert_eq!(ha.map(|x| x as u64).unwrap().len(), a);
        prop_assert_eq!(da.map(|x| x as u64).unwrap().len(), a);
        prop_assert_eq!(ha.zip(&hb, |x, y| x ^ y).unwrap().len(), a.min(b));
        prop_assert_eq!(da.zip(&db, |x: u32, y: u32| x ^ y).unwrap().len(), a.min(b));
    }
}
