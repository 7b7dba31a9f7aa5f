//! # parcoll-core
//!
//! Fixed-size, homogeneous collections with bulk `generate`, `map`, `zip`
//! and `reduce`, built twice:
//!
//! - [`host::Collection`]: single-threaded reference implementation in
//!   process memory. Its results are the oracle.
//! - [`device::Collection`]: the same contract on a simulated accelerator.
//!   Bulk operations are work-group kernels on the device stream and
//!   `reduce` is a parallel tree reduction. Device faults are fatal.
//!
//! The two types deliberately share no runtime interface so that each can
//! be measured on its own terms. They share the tree [`reduce`] engine, the
//! [`cursor`] iterator and the `[e0,e1,...]` display format.
//!
//! ## Example
//!
//! ```rust
//! use parcoll_core::{device, host};
//!
//! let fib = |n: usize| {
//!     let (mut a, mut b) = (0u64, 1u64);
//!     for _ in 0..n {
//!         (a, b) = (b, a + b);
//!     }
//!     a
//! };
//!
//! let on_host = host::Collection::generate(10, fib)?;
//! let on_device = device::Collection::generate(10, fib)?;
//!
//! assert_eq!(on_host.to_vector(), on_device.to_vector());
//! assert_eq!(host::ops::sum(&on_host)?, device::ops::sum(&on_device)?);
//! assert_eq!(on_device.to_string(), "[0,1,1,2,3,5,8,13,21,34]");
//! # Ok::<(), parcoll_core::Error>(())
//! ```
//!
//! ## Empty collections
//!
//! `reduce` on an empty collection returns [`Error::EmptyReduction`] on
//! both backends; `reduce_or` takes the identity to return instead.
//! `sum` and `prod` supply zero and one.

pub mod cursor;
pub mod device;
pub mod error;
pub mod host;
pub mod instrumentation;
pub mod reduce;

pub use error::{Error, Result};
pub use parcoll_backends::{Device, DeviceConfig, DeviceFn, Element};
