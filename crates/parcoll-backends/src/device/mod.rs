//! Accelerator runtime
//!
//! A [`Device`] executes kernels asynchronously on an ordered stream. Each
//! kernel is split into work-groups that run in parallel on the device's
//! worker pool. Errors follow the accelerator model: a bad launch records an
//! asynchronous fault at submission time, a kernel that aborts records an
//! execution fault, and neither is visible until the host checks.
//!
//! [`Device::check`] is the single checkpoint the collection layer uses: it
//! drains asynchronous faults, then synchronizes the stream, and terminates
//! the process on any fault.

mod fault;
mod memory;
mod slice;
mod stream;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::DeviceConfig;
use crate::error::{BackendError, DeviceFault, Result};
use crate::launch::LaunchConfig;
use fault::FaultRegister;
use stream::Stream;

pub use fault::fail_fast;
pub use memory::DeviceMemory;
pub use slice::DeviceSlice;

static GLOBAL_DEVICE: OnceLock<Arc<Device>> = OnceLock::new();
static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(0);

/// Simulated accelerator: memory capacity, one ordered stream, sticky faults
/// and a pool of workers executing work-groups.
pub struct Device {
    id: u64,
    config: DeviceConfig,
    memory: DeviceMemory,
    faults: Arc<FaultRegister>,
    pool: Arc<ThreadPool>,
    stream: Stream,
}

impl Device {
    /// Bring up a device with its own stream, memory and worker pool.
    pub fn new(config: DeviceConfig) -> Result<Arc<Self>> {
        let id = NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed);

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads.unwrap_or(0))
            .thread_name(move |i| format!("parcoll-dev{id}-worker{i}"))
            .build()
            .map_err(|e| BackendError::DeviceInit(format!("failed to build worker pool: {e}")))?;
        let stream = Stream::spawn(format!("parcoll-dev{id}-stream"))?;

        tracing::debug!(
            device = id,
            work_group_size = config.work_group_size,
            memory_capacity_bytes = config.memory_capacity_bytes,
            workers = pool.current_num_threads(),
            "device initialized"
        );

        Ok(Arc::new(Self {
            id,
            memory: DeviceMemory::new(config.memory_capacity_bytes),
            config,
            faults: Arc::new(FaultRegister::default()),
            pool: Arc::new(pool),
            stream,
        }))
    }

    /// Process-wide device, configured from the environment on first use.
    ///
    /// A device that cannot be brought up is fatal.
    pub fn global() -> Arc<Self> {
        let device = GLOBAL_DEVICE.get_or_init(|| match Device::new(DeviceConfig::from_env()) {
            Ok(device) => device,
            Err(err) => {
                tracing::error!(%err, "no usable device");
                eprintln!("parcoll: {err}");
                std::process::abort()
            }
        });
        Arc::clone(device)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn memory(&self) -> &DeviceMemory {
        &self.memory
    }

    /// Launch geometry for `units` elements with the configured group size.
    pub fn launch_config(&self, units: usize) -> LaunchConfig {
        LaunchConfig::linear(units, self.config.work_group_size)
    }

    /// Submit a kernel body to the stream.
    ///
    /// The launch is validated first; an invalid one records an
    /// asynchronous fault and is never queued. The body runs inside the
    /// worker pool, so rayon parallel iterators in it fan out across
    /// work-groups. A panic in the body records an execution fault.
    pub fn launch<K>(&self, kernel: &'static str, config: LaunchConfig, units: usize, body: K)
    where
        K: FnOnce(LaunchConfig) + Send + 'static,
    {
        if let Err(reason) = config.validate(units) {
            self.reject(kernel, reason);
            return;
        }

        parcoll_tracing::performance::record_launch(kernel, config.grid.x, config.block.x, units);

        let pool = Arc::clone(&self.pool);
        let faults = Arc::clone(&self.faults);
        self.stream.submit(Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| pool.install(|| body(config))));
            if let Err(payload) = outcome {
                faults.raise_execution(DeviceFault::Execution {
                    kernel,
                    message: panic_message(payload.as_ref()),
                });
            }
        }));
    }

    /// Record an asynchronous fault for a launch the host refused to queue.
    pub(crate) fn reject(&self, kernel: &'static str, reason: String) {
        tracing::debug!(device = self.id, kernel, %reason, "launch rejected");
        self.faults.raise_async(DeviceFault::Launch { kernel, reason });
    }

    /// Take the pending asynchronous fault, if any. Does not wait for the
    /// stream.
    pub fn drain_async_faults(&self) -> std::result::Result<(), DeviceFault> {
        match self.faults.take_async() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    /// Wait for all submitted kernels, then take any pending fault.
    pub fn synchronize(&self) -> std::result::Result<(), DeviceFault> {
        self.stream.synchronize();
        match self.faults.take_execution().or_else(|| self.faults.take_async()) {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    /// Drain asynchronous faults, then synchronize. Any fault terminates the
    /// process after it is logged against `operation`.
    pub fn check(&self, operation: &str) {
        if let Err(fault) = self.drain_async_faults().and_then(|()| self.synchronize()) {
            fail_fast(operation, &fault);
        }
    }

    /// Whether a fault is waiting for the next check.
    pub fn has_pending_fault(&self) -> bool {
        self.faults.is_pending()
    }

    /// Kernels submitted and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.stream.in_flight()
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("memory", &self.memory)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "kernel panicked".to_string()
    }
}
