//! Substrates for parcoll collections
//!
//! Two places data can live:
//!
//! - **Host**: process memory, touched directly by the calling thread.
//! - **Accelerator**: memory of a [`Device`], touched only by kernels that
//!   run asynchronously on the device's stream.
//!
//! [`Buffer<T, S>`] is the owned allocation on either substrate. The
//! [`kernels`] module holds the elementwise device kernels (`init`, `map`,
//! `zip`) and the halving `step` used by tree reductions.
//!
//! # Device error model
//!
//! Device calls never return kernel errors directly. Invalid launches are
//! recorded as asynchronous faults when submitted; panics inside kernels are
//! recorded as execution faults when they happen. Both stay pending until
//! the host calls [`Device::drain_async_faults`] and
//! [`Device::synchronize`], or [`Device::check`], which runs both and ends
//! the process on a fault.
//!
//! ```rust
//! use parcoll_backends::{kernels, Accelerator, Buffer, Device, DeviceConfig};
//!
//! let device = Device::new(DeviceConfig::default().with_worker_threads(2))?;
//! let squares = Buffer::<u64, Accelerator>::allocate(&device, 6)?;
//! kernels::init(squares.device_slice(), |i| (i * i) as u64);
//! device.check("init");
//! assert_eq!(squares.device_slice().copy_to_host(), vec![0, 1, 4, 9, 16, 25]);
//! # Ok::<(), parcoll_backends::BackendError>(())
//! ```

pub mod buffer;
pub mod config;
pub mod device;
pub mod error;
pub mod kernels;
pub mod launch;

pub use buffer::{Accelerator, Buffer, Element, Host, HostSlice, Substrate};
pub use config::DeviceConfig;
pub use device::{fail_fast, Device, DeviceMemory, DeviceSlice};
pub use error::{BackendError, DeviceFault, FaultClass, Result};
pub use kernels::DeviceFn;
pub use launch::{BlockDim, GridDim, LaunchConfig, MAX_WORK_GROUP_SIZE, WORK_GROUP_SIZE};
