//! Scoped, typed buffers on either substrate
//!
//! A [`Buffer<T, S>`] owns `len` elements of `T` on substrate `S` and
//! returns its storage when dropped. Buffers can be moved but not copied or
//! cloned, so every allocation has exactly one owner.
//!
//! ```rust
//! use parcoll_backends::{Buffer, Host};
//!
//! let mut buf = Buffer::<u32, Host>::allocate(4)?;
//! buf.as_mut_slice().copy_from_slice(&[1, 2, 3, 4]);
//! assert_eq!(buf.as_slice().iter().sum::<u32>(), 10);
//! # Ok::<(), parcoll_backends::BackendError>(())
//! ```

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::Instant;

use parcoll_tracing::performance::{record_allocation, record_release};

use crate::device::{Device, DeviceSlice};
use crate::error::{BackendError, Result};

/// Plain-old-data element types a buffer can hold.
///
/// `Pod` gives the zero-initialized fill and byte-level copies; `Send +
/// Sync` lets work-groups read and write elements from worker threads.
pub trait Element: bytemuck::Pod + Send + Sync {}

impl<T: bytemuck::Pod + Send + Sync> Element for T {}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Host {}
    impl Sealed for super::Accelerator {}
}

/// Memory a buffer lives in.
pub trait Substrate: sealed::Sealed + Sized + Send + Sync + 'static {
    /// Name used in logs and errors.
    const NAME: &'static str;

    /// Owned allocation of `T` elements on this substrate.
    type Slice<T: Element>: Send + Sync;

    fn slice_len<T: Element>(slice: &Self::Slice<T>) -> usize;
}

/// Ordinary process memory.
#[derive(Debug, Clone, Copy)]
pub struct Host;

/// Memory of a [`Device`].
#[derive(Debug, Clone, Copy)]
pub struct Accelerator;

impl Substrate for Host {
    const NAME: &'static str = "host";
    type Slice<T: Element> = HostSlice<T>;

    fn slice_len<T: Element>(slice: &HostSlice<T>) -> usize {
        slice.data.len()
    }
}

impl Substrate for Accelerator {
    const NAME: &'static str = "device";
    type Slice<T: Element> = DeviceSlice<T>;

    fn slice_len<T: Element>(slice: &DeviceSlice<T>) -> usize {
        slice.len()
    }
}

/// Heap allocation that logs its release.
pub struct HostSlice<T: Element> {
    data: Box<[T]>,
}

impl<T: Element> HostSlice<T> {
    fn alloc(len: usize) -> Result<Self> {
        let start = Instant::now();
        let element_size = mem::size_of::<T>();
        let bytes = len
            .checked_mul(element_size)
            .filter(|&bytes| bytes <= isize::MAX as usize)
            .ok_or(BackendError::SizeOverflow {
                substrate: Host::NAME,
                len,
                element_size,
            })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| BackendError::HostAllocation { requested_bytes: bytes })?;
        data.resize(len, T::zeroed());

        record_allocation(bytes, Host::NAME, start.elapsed().as_micros() as u64);
        Ok(Self {
            data: data.into_boxed_slice(),
        })
    }
}

impl<T: Element> Drop for HostSlice<T> {
    fn drop(&mut self) {
        record_release(mem::size_of_val(&*self.data), Host::NAME);
    }
}

/// Owned, typed storage on substrate `S`.
pub struct Buffer<T: Element, S: Substrate> {
    slice: S::Slice<T>,
}

impl<T: Element, S: Substrate> Buffer<T, S> {
    pub fn len(&self) -> usize {
        S::slice_len(&self.slice)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_size(&self) -> usize {
        mem::size_of::<T>()
    }

    pub fn size_bytes(&self) -> usize {
        self.len() * self.element_size()
    }

    pub fn substrate(&self) -> &'static str {
        S::NAME
    }
}

impl<T: Element> Buffer<T, Host> {
    /// Allocate `len` zeroed elements in host memory.
    pub fn allocate(len: usize) -> Result<Self> {
        Ok(Self {
            slice: HostSlice::alloc(len)?,
        })
    }

    pub fn as_slice(&self) -> &[T] {
        &self.slice.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.slice.data
    }
}

impl<T: Element> Buffer<T, Accelerator> {
    /// Allocate `len` zeroed elements in `device` memory.
    pub fn allocate(device: &Arc<Device>, len: usize) -> Result<Self> {
        Ok(Self {
            slice: DeviceSlice::alloc(device, len)?,
        })
    }

    pub fn device_slice(&self) -> &DeviceSlice<T> {
        &self.slice
    }

    pub fn device(&self) -> &Arc<Device> {
        self.slice.device()
    }
}

impl<T: Element, S: Substrate> fmt::Debug for Buffer<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("substrate", &S::NAME)
            .field("len", &self.len())
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;

    #[test]
    fn host_buffer_is_zeroed() {
        let buf = Buffer::<f64, Host>::allocate(8).unwrap();
        assert_eq!(buf.len(), 8);
        assert_eq!(buf.size_bytes(), 64);
        assert_eq!(buf.substrate(), "host");
        assert!(buf.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn empty_buffers_are_allowed() {
        let buf = Buffer::<u8, Host>::allocate(0).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn host_size_overflow_is_an_allocation_error() {
        let err = Buffer::<u64, Host>::allocate(usize::MAX / 4).unwrap_err();
        assert!(matches!(err, BackendError::SizeOverflow { substrate: "host", .. }));
    }

    #[test]
    fn device_buffer_releases_on_drop() {
        let device = Device::new(DeviceConfig::default().with_memory_capacity(256).with_worker_threads(1)).unwrap();
        {
            let buf = Buffer::<u32, Accelerator>::allocate(&device, 32).unwrap();
            assert_eq!(buf.substrate(), "device");
            assert_eq!(device.memory().used_bytes(), 128);
            assert_eq!(buf.device().id(), device.id());
        }
        assert_eq!(device.memory().used_bytes(), 0);
    }

    #[test]
    fn moving_a_buffer_keeps_one_reservation() {
        let device = Device::new(DeviceConfig::default().with_memory_capacity(256).with_worker_threads(1)).unwrap();
        let buf = Buffer::<u32, Accelerator>::allocate(&device, 16).unwrap();
        let moved = buf;
        assert_eq!(device.memory().live_buffers(), 1);
        drop(moved);
        assert_eq!(device.memory().live_buffers(), 0);
    }
}
