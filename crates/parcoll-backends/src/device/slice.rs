//! Typed allocations in device memory

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::Instant;

use parcoll_tracing::performance::{record_allocation, record_release, record_transfer};
use parking_lot::RwLock;

use super::Device;
use crate::buffer::Element;
use crate::error::{BackendError, Result};

/// `len` elements of `T` reserved against a device's memory capacity.
///
/// Kernels share the storage through an `Arc`, so a slice may be dropped
/// while a kernel that uses it is still queued. Dropping such a slice waits
/// for the stream to go idle before the capacity reservation is returned,
/// so `used_bytes` never undercounts storage a kernel still holds.
pub struct DeviceSlice<T: Element> {
    id: u64,
    len: usize,
    data: Arc<RwLock<Vec<T>>>,
    device: Arc<Device>,
}

impl<T: Element> DeviceSlice<T> {
    /// Reserve and zero-fill `len` elements on `device`.
    pub fn alloc(device: &Arc<Device>, len: usize) -> Result<Self> {
        let start = Instant::now();
        let element_size = mem::size_of::<T>();
        let bytes = len.checked_mul(element_size).ok_or(BackendError::SizeOverflow {
            substrate: "device",
            len,
            element_size,
        })?;

        let id = device.memory.reserve(bytes)?;
        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            device.memory.release(bytes);
            return Err(BackendError::DeviceAllocation {
                requested_bytes: bytes,
                available_bytes: device.memory.available_bytes(),
                capacity_bytes: device.memory.capacity_bytes(),
            });
        }
        data.resize(len, T::zeroed());

        record_allocation(bytes, "device", start.elapsed().as_micros() as u64);

        Ok(Self {
            id,
            len,
            data: Arc::new(RwLock::new(data)),
            device: Arc::clone(device),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn size_bytes(&self) -> usize {
        self.len * mem::size_of::<T>()
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub(crate) fn storage(&self) -> &Arc<RwLock<Vec<T>>> {
        &self.data
    }

    /// Whether both slices name the same allocation.
    pub fn same_allocation(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Read one element (D2H). Waits for queued kernels first.
    pub fn read_element(&self, index: usize) -> Result<T> {
        self.ensure_in_range(index)?;
        self.device.check("device read");
        Ok(self.data.read()[index])
    }

    /// Overwrite one element (H2D). Waits for queued kernels first.
    pub fn write_element(&self, index: usize, value: T) -> Result<()> {
        self.ensure_in_range(index)?;
        self.device.check("device write");
        self.data.write()[index] = value;
        Ok(())
    }

    /// Copy the whole allocation to a new host vector (D2H).
    pub fn copy_to_host(&self) -> Vec<T> {
        self.device.check("device copy to host");
        let start = Instant::now();
        let host = self.data.read().clone();
        record_transfer(self.size_bytes(), "D2H", start.elapsed().as_micros() as u64);
        host
    }

    /// Overwrite the whole allocation from a host slice of equal length (H2D).
    pub fn copy_from_host(&self, src: &[T]) -> Result<()> {
        if src.len() != self.len {
            return Err(BackendError::TransferSizeMismatch {
                expected: self.len,
                actual: src.len(),
            });
        }
        self.device.check("device copy from host");
        let start = Instant::now();
        self.data.write().copy_from_slice(src);
        record_transfer(self.size_bytes(), "H2D", start.elapsed().as_micros() as u64);
        Ok(())
    }

    fn ensure_in_range(&self, index: usize) -> Result<()> {
        if index < self.len {
            Ok(())
        } else {
            Err(BackendError::TransferOutOfRange { index, len: self.len })
        }
    }
}

impl<T: Element> Drop for DeviceSlice<T> {
    fn drop(&mut self) {
        // Release never raises; a fault pending here belongs to the next check.
        if self.device.has_pending_fault() {
            tracing::warn!(
                device = self.device.id(),
                buffer = self.id,
                "releasing device buffer with a fault pending"
            );
        }
        if Arc::strong_count(&self.data) > 1 {
            // Waits only; faults stay pending.
            self.device.stream.synchronize();
        }
        self.device.memory.release(self.size_bytes());
        record_release(self.size_bytes(), "device");
    }
}

impl<T: Element> fmt::Debug for DeviceSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSlice")
            .field("id", &self.id)
            .field("device", &self.device.id())
            .field("len", &self.len)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}
