//! Error types for substrate operations

/// Result type for substrate operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors reported synchronously by a substrate call
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Element count times element size does not fit in `usize`
    #[error("{substrate} allocation of {len} elements x {element_size} bytes overflows the address space")]
    SizeOverflow {
        substrate: &'static str,
        len: usize,
        element_size: usize,
    },

    /// The host allocator refused the request
    #[error("host allocation of {requested_bytes} bytes failed")]
    HostAllocation { requested_bytes: usize },

    /// The device has not enough free memory left
    #[error("device allocation of {requested_bytes} bytes failed: {available_bytes} of {capacity_bytes} bytes free")]
    DeviceAllocation {
        requested_bytes: usize,
        available_bytes: usize,
        capacity_bytes: usize,
    },

    /// Element transfer addressed past the end of a buffer
    #[error("transfer out of range: index {index} >= length {len}")]
    TransferOutOfRange { index: usize, len: usize },

    /// Bulk transfer with a mismatched element count
    #[error("transfer size mismatch: buffer holds {expected} elements, source has {actual}")]
    TransferSizeMismatch { expected: usize, actual: usize },

    /// The device runtime could not be brought up
    #[error("device initialization failed: {0}")]
    DeviceInit(String),
}

/// Which of the two device checks surfaced a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// Raised when work is submitted (bad launch geometry, bad operands)
    Asynchronous,
    /// Raised while a kernel was running on the device
    Execution,
}

/// A fault recorded by the device runtime
///
/// Faults are sticky: once raised they stay pending until the matching
/// check takes them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceFault {
    /// Rejected at submission time
    #[error("launch of `{kernel}` rejected: {reason}")]
    Launch { kernel: &'static str, reason: String },

    /// Kernel aborted while executing
    #[error("kernel `{kernel}` faulted: {message}")]
    Execution { kernel: &'static str, message: String },
}

impl DeviceFault {
    /// Check that surfaces this fault.
    pub fn class(&self) -> FaultClass {
        match self {
            DeviceFault::Launch { .. } => FaultClass::Asynchronous,
            DeviceFault::Execution { .. } => FaultClass::Execution,
        }
    }

    /// Kernel the fault is attributed to.
    pub fn kernel(&self) -> &'static str {
        match self {
            DeviceFault::Launch { kernel, .. } | DeviceFault::Execution { kernel, .. } => kernel,
        }
    }
}
