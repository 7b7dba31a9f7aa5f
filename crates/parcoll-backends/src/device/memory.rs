//! Device memory accounting
//!
//! The device owns a fixed capacity. Every live device slice holds a
//! reservation against it; dropping the slice returns the bytes once no
//! queued kernel still holds its storage.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::{BackendError, Result};

#[derive(Debug)]
pub struct DeviceMemory {
    capacity_bytes: usize,
    used_bytes: Mutex<usize>,
    live_buffers: AtomicU64,
    next_buffer_id: AtomicU64,
}

impl DeviceMemory {
    pub(crate) fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            used_bytes: Mutex::new(0),
            live_buffers: AtomicU64::new(0),
            next_buffer_id: AtomicU64::new(1),
        }
    }

    /// Reserve `bytes` and return the id of the new buffer.
    pub(crate) fn reserve(&self, bytes: usize) -> Result<u64> {
        let mut used = self.used_bytes.lock();
        let available = self.capacity_bytes - *used;
        if bytes > available {
            return Err(BackendError::DeviceAllocation {
                requested_bytes: bytes,
                available_bytes: available,
                capacity_bytes: self.capacity_bytes,
            });
        }
        *used += bytes;
        self.live_buffers.fetch_add(1, Ordering::Relaxed);
        Ok(self.next_buffer_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn release(&self, bytes: usize) {
        let mut used = self.used_bytes.lock();
        *used = used.saturating_sub(bytes);
        self.live_buffers.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    pub fn used_bytes(&self) -> usize {
        *self.used_bytes.lock()
    }

    pub fn available_bytes(&self) -> usize {
        self.capacity_bytes - self.used_bytes()
    }

    /// Number of device buffers currently holding a reservation.
    pub fn live_buffers(&self) -> u64 {
        self.live_buffers.load(Ordering::Relaxed)
    }
}
