//! Performance-focused tracing utilities
//!
//! Timing guards and standard-format events for the quantities the collection
//! backends care about: bytes reserved on a substrate, kernels launched onto
//! the device stream, and host/device transfers.
//!
//! ```rust
//! use parcoll_tracing::performance::{record_allocation, PerformanceSpan};
//!
//! let span = PerformanceSpan::new("zip", Some(100));
//! // ... do work ...
//! drop(span); // logged only if it took at least 100us
//!
//! record_allocation(4096, "device", 12);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tracing::Level;

static SPANS_ENABLED: AtomicBool = AtomicBool::new(true);
// u64::MAX means no process-wide threshold.
static DEFAULT_THRESHOLD_US: AtomicU64 = AtomicU64::new(u64::MAX);

/// Process-wide switches applied by [`crate::init_global_tracing`].
///
/// Disabled spans still measure time but never log. `threshold_us` applies
/// to spans created without their own threshold.
pub fn configure(enabled: bool, threshold_us: Option<u64>) {
    SPANS_ENABLED.store(enabled, Ordering::Relaxed);
    DEFAULT_THRESHOLD_US.store(threshold_us.unwrap_or(u64::MAX), Ordering::Relaxed);
}

fn default_threshold() -> Option<u64> {
    match DEFAULT_THRESHOLD_US.load(Ordering::Relaxed) {
        u64::MAX => None,
        threshold => Some(threshold),
    }
}

/// RAII guard that measures its own lifetime and logs it on drop when the
/// duration reaches the optional threshold.
pub struct PerformanceSpan {
    name: String,
    threshold_us: Option<u64>,
    start_time: Instant,
    span: tracing::Span,
}

impl PerformanceSpan {
    /// Create a debug-level performance span.
    ///
    /// `threshold_us` of `None` falls back to the configured default, and
    /// logs every span when there is none.
    pub fn new(name: impl Into<String>, threshold_us: Option<u64>) -> Self {
        Self::with_level(Level::DEBUG, name, threshold_us)
    }

    /// Create a performance span at the given level.
    pub fn with_level(level: Level, name: impl Into<String>, threshold_us: Option<u64>) -> Self {
        let name = name.into();
        let span = match level {
            Level::TRACE => tracing::trace_span!("perf", name = %name),
            Level::DEBUG => tracing::debug_span!("perf", name = %name),
            Level::INFO => tracing::info_span!("perf", name = %name),
            Level::WARN => tracing::warn_span!("perf", name = %name),
            Level::ERROR => tracing::error_span!("perf", name = %name),
        };

        Self {
            name,
            threshold_us: threshold_us.or_else(default_threshold),
            start_time: Instant::now(),
            span,
        }
    }

    /// Name the span was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Microseconds since the span was created.
    pub fn elapsed_us(&self) -> u64 {
        self.start_time.elapsed().as_micros() as u64
    }

    /// Nanoseconds since the span was created.
    pub fn elapsed_ns(&self) -> u64 {
        self.start_time.elapsed().as_nanos() as u64
    }

    /// Enter this span's context.
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for PerformanceSpan {
    fn drop(&mut self) {
        if !SPANS_ENABLED.load(Ordering::Relaxed) {
            return;
        }
        let elapsed_us = self.elapsed_us();
        if self.threshold_us.is_none_or(|t| elapsed_us >= t) {
            let _entered = self.span.enter();
            tracing::debug!(
                duration_us = elapsed_us,
                duration_ms = elapsed_us as f64 / 1000.0,
                "performance_span_complete"
            );
        }
    }
}

/// Record bytes reserved on a substrate.
pub fn record_allocation(size_bytes: usize, substrate: &str, duration_us: u64) {
    tracing::debug!(
        event = "allocation",
        size_bytes = size_bytes,
        size_kb = size_bytes as f64 / 1024.0,
        substrate = substrate,
        duration_us = duration_us,
        "memory_allocation"
    );
}

/// Record bytes returned to a substrate.
pub fn record_release(size_bytes: usize, substrate: &str) {
    tracing::debug!(
        event = "release",
        size_bytes = size_bytes,
        substrate = substrate,
        "memory_release"
    );
}

/// Record a kernel launch onto the device stream.
pub fn record_launch(kernel: &str, groups: u32, group_size: u32, units: usize) {
    tracing::trace!(
        event = "launch",
        kernel = kernel,
        groups = groups,
        group_size = group_size,
        units = units,
        "kernel_launch"
    );
}

/// Record a host/device transfer with its bandwidth.
///
/// `direction` is one of `"H2D"` or `"D2H"`.
pub fn record_transfer(bytes: usize, direction: &str, duration_us: u64) {
    tracing::debug!(
        event = "transfer",
        bytes = bytes,
        direction = direction,
        duration_us = duration_us,
        bandwidth_mbps = bandwidth_mbps(bytes, duration_us),
        "data_transfer"
    );
}

/// Record elements processed per second for a container operation.
pub fn record_throughput(operation: &str, elements: usize, duration_us: u64) {
    let elements_per_sec = if duration_us > 0 {
        (elements as f64 / duration_us as f64) * 1_000_000.0
    } else {
        0.0
    };

    tracing::debug!(
        event = "throughput",
        operation = operation,
        elements = elements,
        duration_us = duration_us,
        melems_per_sec = elements_per_sec / 1_000_000.0,
        "operation_throughput"
    );
}

fn bandwidth_mbps(bytes: usize, duration_us: u64) -> f64 {
    if duration_us == 0 {
        return 0.0;
    }
    (bytes as f64 / duration_us as f64) * 1_000_000.0 / (1024.0 * 1024.0)
}
