//! Convenience macros for performance tracing.

/// Create a [`crate::performance::PerformanceSpan`] guard, optionally
/// recording extra fields on a debug span.
///
/// ```rust
/// use parcoll_tracing::perf_span;
///
/// {
///     let _span = perf_span!("device_zip", n = 1024);
///     // ... operation code ...
/// } // duration logged here
/// ```
#[macro_export]
macro_rules! perf_span {
    ($name:expr) => {{
        $crate::performance::PerformanceSpan::new($name, None)
    }};
    ($name:expr, $($field:tt = $value:expr),+ $(,)?) => {{
        $crate::debug!(
            target: "parcoll_tracing::perf",
            name = $name,
            $($field = $value),+
        );
        $crate::performance::PerformanceSpan::new($name, None)
    }};
}

/// Evaluate a block and return `(result, elapsed_nanoseconds)`.
///
/// ```rust
/// use parcoll_tracing::timed_block;
///
/// let (sum, elapsed_ns) = timed_block!("sum", { (1..=100).sum::<i32>() });
/// assert_eq!(sum, 5050);
/// let _ = elapsed_ns;
/// ```
#[macro_export]
macro_rules! timed_block {
    ($name:expr, $block:block) => {{
        let start = std::time::Instant::now();
        let result = $block;
        let elapsed_ns = start.elapsed().as_nanos() as u64;
        $crate::debug!(operation = $name, elapsed_ns = elapsed_ns, "timed_block_complete");
        (result, elapsed_ns)
    }};
}
