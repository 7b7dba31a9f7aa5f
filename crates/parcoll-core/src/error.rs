//! Error types for collection operations

use parcoll_backends::BackendError;

/// Result type for collection operations
pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable collection errors
///
/// Device faults are not listed here: they end the process at the check
/// that observes them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The substrate could not reserve storage for the collection
    #[error("cannot allocate {len} elements on {substrate}: {source}")]
    Allocation {
        substrate: &'static str,
        len: usize,
        #[source]
        source: BackendError,
    },

    /// Point access outside `[0, size)`
    #[error("{op}: index {index} out of bounds for collection of size {size}")]
    OutOfBounds { op: &'static str, index: usize, size: usize },

    /// `reduce` on a collection with no elements
    #[error("cannot reduce an empty collection without an identity element")]
    EmptyReduction,

    /// Operands of a binary operation live on different devices
    #[error("{op}: operands live on devices {left} and {right}")]
    DeviceMismatch { op: &'static str, left: u64, right: u64 },

    /// Any other substrate error
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl Error {
    pub(crate) fn allocation(substrate: &'static str, len: usize) -> impl FnOnce(BackendError) -> Self {
        move |source| Error::Allocation { substrate, len, source }
    }

    pub(crate) fn bounds(op: &'static str, index: usize, size: usize) -> Result<()> {
        if index < size {
            Ok(())
        } else {
            Err(Error::OutOfBounds { op, index, size })
        }
    }
}
