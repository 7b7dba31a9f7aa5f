//! Elementwise device kernels
//!
//! Every kernel is asynchronous: it validates its operands, submits a body
//! to the device stream and returns. Operand problems (mismatched lengths,
//! buffers from another device, a bad group size) are reported as
//! asynchronous faults, exactly like an invalid launch. Results become
//! visible after the next [`Device::check`](crate::Device::check).
//!
//! Each body splits the element range into work-groups of
//! `config.block.x` lanes and runs the groups in parallel.

use rayon::prelude::*;

use crate::buffer::Element;
use crate::device::DeviceSlice;
use crate::launch::LaunchConfig;

/// Functions that may run on the device: plain values that can be copied
/// into every work-group and shared across worker threads.
pub trait DeviceFn: Copy + Send + Sync + 'static {}

impl<F: Copy + Send + Sync + 'static> DeviceFn for F {}

/// `dest[i] = f(i)` for every `i < dest.len()`.
pub fn init<T, F>(dest: &DeviceSlice<T>, f: F)
where
    T: Element,
    F: Fn(usize) -> T + DeviceFn,
{
    let n = dest.len();
    if n == 0 {
        return;
    }
    let device = dest.device();
    let out = dest.storage().clone();

    device.launch("init", device.launch_config(n), n, move |config: LaunchConfig| {
        let group = config.group_len();
        out.write().par_chunks_mut(group).enumerate().for_each(|(g, chunk)| {
            let base = g * group;
            for (lane, x) in chunk.iter_mut().enumerate() {
                *x = f(base + lane);
            }
        });
    });
}

/// `dest[i] = f(src[i])` for every `i < dest.len()`.
pub fn map<T, U, F>(src: &DeviceSlice<T>, dest: &DeviceSlice<U>, f: F)
where
    T: Element,
    U: Element,
    F: Fn(T) -> U + DeviceFn,
{
    let n = dest.len();
    let device = dest.device();
    if !same_device(src, dest) {
        device.reject("map", "operands live on different devices".to_string());
        return;
    }
    if src.len() < n {
        device.reject("map", format!("source holds {} elements, destination {n}", src.len()));
        return;
    }
    if n == 0 {
        return;
    }
    let input = src.storage().clone();
    let out = dest.storage().clone();

    device.launch("map", device.launch_config(n), n, move |config: LaunchConfig| {
        let group = config.group_len();
        let input = input.read();
        out.write()
            .par_chunks_mut(group)
            .zip(input[..n].par_chunks(group))
            .for_each(|(chunk, src)| {
                for (x, &a) in chunk.iter_mut().zip(src) {
                    *x = f(a);
                }
            });
    });
}

/// `dest[i] = f(a[i], b[i])` for every `i < dest.len()`.
///
/// `a` and `b` may be the same allocation.
pub fn zip<T, V, U, F>(a: &DeviceSlice<T>, b: &DeviceSlice<V>, dest: &DeviceSlice<U>, f: F)
where
    T: Element,
    V: Element,
    U: Element,
    F: Fn(T, V) -> U + DeviceFn,
{
    let n = dest.len();
    let device = dest.device();
    if !same_device(a, dest) || !same_device(b, dest) {
        device.reject("zip", "operands live on different devices".to_string());
        return;
    }
    if a.len() < n || b.len() < n {
        device.reject(
            "zip",
            format!("inputs hold {} and {} elements, destination {n}", a.len(), b.len()),
        );
        return;
    }
    if n == 0 {
        return;
    }
    let lhs = a.storage().clone();
    let rhs = b.storage().clone();
    let out = dest.storage().clone();

    device.launch("zip", device.launch_config(n), n, move |config: LaunchConfig| {
        let group = config.group_len();
        // Recursive reads: both inputs may be one allocation.
        let lhs = lhs.read_recursive();
        let rhs = rhs.read_recursive();
        out.write()
            .par_chunks_mut(group)
            .zip(lhs[..n].par_chunks(group))
            .zip(rhs[..n].par_chunks(group))
            .for_each(|((chunk, xs), ys)| {
                for ((x, &l), &r) in chunk.iter_mut().zip(xs).zip(ys) {
                    *x = f(l, r);
                }
            });
    });
}

/// One halving round of a tree reduction over the first `n` elements of
/// `src`, writing `span = ceil(n / 2)` results to `dest`:
///
/// `dest[i] = f(src[i], src[i + span])` when `i + span < n`, otherwise
/// `dest[i] = src[i]`.
///
/// `src` and `dest` may be the same allocation; the round then runs in place
/// on the lower half.
pub fn step<T, F>(src: &DeviceSlice<T>, dest: &DeviceSlice<T>, n: usize, f: F)
where
    T: Element,
    F: Fn(T, T) -> T + DeviceFn,
{
    let device = dest.device();
    let span = n.div_ceil(2);
    if !same_device(src, dest) {
        device.reject("step", "operands live on different devices".to_string());
        return;
    }
    if n > src.len() || span > dest.len() {
        device.reject(
            "step",
            format!(
                "round over {n} elements needs source >= {n} and destination >= {span}, got {} and {}",
                src.len(),
                dest.len()
            ),
        );
        return;
    }
    if n == 0 {
        return;
    }

    if src.same_allocation(dest) {
        let data = dest.storage().clone();
        device.launch("step", device.launch_config(span), span, move |config: LaunchConfig| {
            let group = config.group_len();
            let mut data = data.write();
            let (lower, upper) = data[..n].split_at_mut(span);
            let upper: &[T] = upper;
            lower.par_chunks_mut(group).enumerate().for_each(|(g, chunk)| {
                let base = g * group;
                for (lane, x) in chunk.iter_mut().enumerate() {
                    // The middle element of an odd round has no partner.
                    if let Some(&partner) = upper.get(base + lane) {
                        *x = f(*x, partner);
                    }
                }
            });
        });
    } else {
        let input = src.storage().clone();
        let out = dest.storage().clone();
        device.launch("step", device.launch_config(span), span, move |config: LaunchConfig| {
            let group = config.group_len();
            let input = input.read();
            let (lower, upper) = input[..n].split_at(span);
            out.write()[..span]
                .par_chunks_mut(group)
                .enumerate()
                .for_each(|(g, chunk)| {
                    let base = g * group;
                    for (lane, x) in chunk.iter_mut().enumerate() {
                        let i = base + lane;
                        *x = match upper.get(i) {
                            Some(&partner) => f(lower[i], partner),
                            None => lower[i],
                        };
                    }
                });
        });
    }
}

fn same_device<T: Element, U: Element>(a: &DeviceSlice<T>, b: &DeviceSlice<U>) -> bool {
    a.device().id() == b.device().id()
}
