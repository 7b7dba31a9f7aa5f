//! Accelerator backend
//!
//! Storage lives in device memory and every bulk operation is a kernel on
//! the device stream. Operations that produce a value the caller can see
//! finish with [`Device::check`], so each call below blocks until its
//! kernels are done and ends the process if the device faulted. Allocation
//! and bounds errors are still returned as [`Error`]s.
//!
//! Collections use [`Device::global`] unless built with one of the `_on`
//! constructors; derived collections live on the device of their source.

pub mod ops;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parcoll_backends::{fail_fast, kernels, Accelerator, Buffer, Device, DeviceFault, DeviceFn, DeviceSlice, Element};
use parcoll_tracing::perf_span;

use crate::cursor::{write_list, Cursor, PointRead};
use crate::error::{Error, Result};
use crate::instrumentation::OperationMetrics;
use crate::reduce::{self, Round, TreeStep};

/// Fixed-size collection in device memory.
pub struct Collection<T: Element> {
    buffer: Buffer<T, Accelerator>,
}

impl<T: Element> Collection<T> {
    /// Build `size` elements on the global device with `element(i)` at
    /// index `i`. Indices are computed in parallel, in no particular order.
    pub fn generate<F>(size: usize, element: F) -> Result<Self>
    where
        F: Fn(usize) -> T + DeviceFn,
    {
        Self::generate_on(&Device::global(), size, element)
    }

    pub fn generate_on<F>(device: &Arc<Device>, size: usize, element: F) -> Result<Self>
    where
        F: Fn(usize) -> T + DeviceFn,
    {
        let start = Instant::now();
        let collection = Self::allocate(device, size)?;
        kernels::init(collection.slice(), element);
        device.check("generate");
        OperationMetrics::new("generate", "device", size, start).log();
        Ok(collection)
    }

    /// Copy `values` into a new collection on the global device.
    pub fn from_slice(values: &[T]) -> Result<Self> {
        Self::from_slice_on(&Device::global(), values)
    }

    pub fn from_slice_on(device: &Arc<Device>, values: &[T]) -> Result<Self> {
        let collection = Self::allocate(device, values.len())?;
        collection.slice().copy_from_host(values)?;
        Ok(collection)
    }

    fn allocate(device: &Arc<Device>, len: usize) -> Result<Self> {
        let buffer = Buffer::<T, Accelerator>::allocate(device, len).map_err(Error::allocation("device", len))?;
        Ok(Self { buffer })
    }

    fn slice(&self) -> &DeviceSlice<T> {
        self.buffer.device_slice()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn device(&self) -> &Arc<Device> {
        self.buffer.device()
    }

    /// New collection with `f(self[i])` at every index.
    pub fn map<U, F>(&self, f: F) -> Result<Collection<U>>
    where
        U: Element,
        F: Fn(T) -> U + DeviceFn,
    {
        let start = Instant::now();
        let out = Collection::<U>::allocate(self.device(), self.len())?;
        kernels::map(self.slice(), out.slice(), f);
        self.device().check("map");
        OperationMetrics::new("map", "device", self.len(), start).log();
        Ok(out)
    }

    /// New collection of `min(self.len(), other.len())` elements with
    /// `f(self[i], other[i])` at index `i`. `other` must live on the same
    /// device, otherwise [`Error::DeviceMismatch`] is returned and nothing
    /// is launched.
    pub fn zip<V, U, F>(&self, other: &Collection<V>, f: F) -> Result<Collection<U>>
    where
        V: Element,
        U: Element,
        F: Fn(T, V) -> U + DeviceFn,
    {
        let start = Instant::now();
        if self.device().id() != other.device().id() {
            return Err(Error::DeviceMismatch {
                op: "zip",
                left: self.device().id(),
                right: other.device().id(),
            });
        }
        let n = self.len().min(other.len());
        let out = Collection::<U>::allocate(self.device(), n)?;
        kernels::zip(self.slice(), other.slice(), out.slice(), f);
        self.device().check("zip");
        OperationMetrics::new("zip", "device", n, start).log();
        Ok(out)
    }

    /// Read one element. A device-to-host transfer per call.
    pub fn get(&self, index: usize) -> Result<T> {
        Error::bounds("get", index, self.len())?;
        Ok(self.slice().read_element(index)?)
    }

    /// Write one element. A host-to-device transfer per call.
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        Error::bounds("set", index, self.len())?;
        Ok(self.slice().write_element(index, value)?)
    }

    pub fn to_vector(&self) -> Vec<T> {
        self.slice().copy_to_host()
    }

    /// Tree reduction on the device.
    ///
    /// `f` should be associative and commutative; results for floating
    /// point types may differ from a left fold in the last bits. Returns
    /// [`Error::EmptyReduction`] on an empty collection.
    pub fn reduce<F>(&self, f: F) -> Result<T>
    where
        F: Fn(T, T) -> T + DeviceFn,
    {
        let n = self.len();
        let _span = perf_span!("device_reduce", elements = n);
        let start = Instant::now();
        match n {
            0 => return Err(Error::EmptyReduction),
            1 => return self.get(0),
            _ => {}
        }

        // Released on every return path, including errors.
        let scratch_len = reduce::scratch_len(n);
        let scratch = Buffer::<T, Accelerator>::allocate(self.device(), scratch_len)
            .map_err(Error::allocation("device", scratch_len))?;
        let mut rounds = DeviceRounds {
            src: self.slice(),
            scratch: scratch.device_slice(),
            combine: f,
        };
        if let Err(fault) = reduce::drive(n, &mut rounds) {
            fail_fast("reduce", &fault);
        }
        self.device().check("reduce");

        let result = scratch.device_slice().read_element(0)?;
        OperationMetrics::new("reduce", "device", n, start).log();
        Ok(result)
    }

    /// `reduce`, or `identity` when the collection is empty.
    pub fn reduce_or<F>(&self, identity: T, f: F) -> Result<T>
    where
        F: Fn(T, T) -> T + DeviceFn,
    {
        if self.is_empty() {
            return Ok(identity);
        }
        self.reduce(f)
    }

    /// Cursor over the elements; each step is a point read.
    pub fn iter(&self) -> Cursor<'_, Self> {
        Cursor::new(self)
    }
}

struct DeviceRounds<'a, T: Element, F> {
    src: &'a DeviceSlice<T>,
    scratch: &'a DeviceSlice<T>,
    combine: F,
}

impl<T: Element, F: Fn(T, T) -> T + DeviceFn> TreeStep for DeviceRounds<'_, T, F> {
    type Error = DeviceFault;

    // The next round reads this one's output, so a rejected launch must
    // surface before it is queued.
    fn step(&mut self, round: Round) -> std::result::Result<(), DeviceFault> {
        let from = if round.index == 0 { self.src } else { self.scratch };
        kernels::step(from, self.scratch, round.active, self.combine);
        self.scratch.device().drain_async_faults()
    }
}

impl<T: Element> PointRead for Collection<T> {
    type Item = T;

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn read_at(&self, index: usize) -> Option<T> {
        self.get(index).ok()
    }
}

impl<'a, T: Element> IntoIterator for &'a Collection<T> {
    type Item = T;
    type IntoIter = Cursor<'a, Collection<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Element + fmt::Display> fmt::Display for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, self.to_vector())
    }
}

impl<T: Element> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("device::Collection")
            .field("device", &self.device().id())
            .field("len", &self.len())
            .finish()
    }
}
