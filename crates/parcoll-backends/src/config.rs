//! Device runtime configuration

use std::env;

use crate::launch::{MAX_WORK_GROUP_SIZE, WORK_GROUP_SIZE};

/// Default device memory capacity: 4 GiB.
pub const DEFAULT_MEMORY_CAPACITY_BYTES: usize = 4 << 30;

/// Settings for a [`crate::Device`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Lanes per work-group for collection kernels.
    pub work_group_size: u32,
    /// Bytes of device memory buffers may reserve in total.
    pub memory_capacity_bytes: usize,
    /// Worker threads executing work-groups. `None` uses one per core.
    pub worker_threads: Option<usize>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            work_group_size: WORK_GROUP_SIZE,
            memory_capacity_bytes: DEFAULT_MEMORY_CAPACITY_BYTES,
            worker_threads: None,
        }
    }
}

impl DeviceConfig {
    pub fn with_work_group_size(mut self, work_group_size: u32) -> Self {
        self.work_group_size = work_group_size;
        self
    }

    pub fn with_memory_capacity(mut self, bytes: usize) -> Self {
        self.memory_capacity_bytes = bytes;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Build a configuration from the environment, starting from defaults.
    ///
    /// # Environment Variables
    ///
    /// - `PARCOLL_DEVICE_GROUP_SIZE` - lanes per work-group, `1..=1024`
    /// - `PARCOLL_DEVICE_MEMORY_MB` - device memory capacity in MiB
    /// - `PARCOLL_DEVICE_THREADS` - worker threads, at least 1
    ///
    /// Unparseable or out-of-range values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(size) = read_var::<u32>("PARCOLL_DEVICE_GROUP_SIZE") {
            if (1..=MAX_WORK_GROUP_SIZE).contains(&size) {
                config.work_group_size = size;
            } else {
                tracing::warn!(value = size, "PARCOLL_DEVICE_GROUP_SIZE out of range, keeping default");
            }
        }

        if let Some(mib) = read_var::<usize>("PARCOLL_DEVICE_MEMORY_MB") {
            match mib.checked_mul(1 << 20) {
                Some(bytes) => config.memory_capacity_bytes = bytes,
                None => tracing::warn!(value = mib, "PARCOLL_DEVICE_MEMORY_MB overflows, keeping default"),
            }
        }

        if let Some(threads) = read_var::<usize>("PARCOLL_DEVICE_THREADS") {
            if threads > 0 {
                config.worker_threads = Some(threads);
            } else {
                tracing::warn!("PARCOLL_DEVICE_THREADS must be at least 1, keeping default");
            }
        }

        config
    }
}

fn read_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable device setting");
            None
        }
    }
}
