//! Per-operation metrics for collection calls
//!
//! ```rust
//! use parcoll_core::instrumentation::OperationMetrics;
//!
//! let start = std::time::Instant::now();
//! // ... run the operation ...
//! OperationMetrics::new("zip", "device", 1 << 20, start).log();
//! ```

use std::time::Instant;

use parcoll_tracing::performance::record_throughput;

/// Timing of one collection operation
#[derive(Debug, Clone)]
pub struct OperationMetrics {
    /// Operation name (`generate`, `map`, `zip`, `reduce`, ...)
    pub operation: &'static str,
    /// `host` or `device`
    pub backend: &'static str,
    /// Elements the operation touched
    pub elements: usize,
    /// Wall time including device synchronization, in microseconds
    pub duration_us: u64,
}

impl OperationMetrics {
    pub fn new(operation: &'static str, backend: &'static str, elements: usize, start: Instant) -> Self {
        Self {
            operation,
            backend,
            elements,
            duration_us: start.elapsed().as_micros() as u64,
        }
    }

    /// Millions of elements per second.
    pub fn melems_per_sec(&self) -> f64 {
        if self.duration_us == 0 {
            return 0.0;
        }
        self.elements as f64 / self.duration_us as f64
    }

    /// Emit the completion event and the shared throughput event.
    pub fn log(&self) {
        tracing::debug!(
            operation = self.operation,
            backend = self.backend,
            elements = self.elements,
            duration_us = self.duration_us,
            "operation_complete"
        );
        record_throughput(self.operation, self.elements, self.duration_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    #[derive(Clone, Default)]
    struct Targets(Arc<Mutex<Vec<String>>>);

    impl<S: tracing::Subscriber> Layer<S> for Targets {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(event.metadata().target().to_string());
        }
    }

    #[test]
    fn log_goes_through_the_shared_throughput_event() {
        let targets = Targets::default();
        let subscriber = tracing_subscriber::registry().with(targets.clone());
        tracing::subscriber::with_default(subscriber, || {
            OperationMetrics::new("zip", "host", 64, Instant::now()).log();
        });

        let seen = targets.0.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().any(|t| t == "parcoll_tracing::performance"));
    }

    #[test]
    fn throughput_in_millions_per_second() {
        let metrics = OperationMetrics {
            operation: "map",
            backend: "host",
            elements: 2_000_000,
            duration_us: 1_000_000,
        };
        assert!((metrics.melems_per_sec() - 2.0).abs() < 1e-12);
        metrics.log();
    }

    #[test]
    fn zero_duration_reports_zero() {
        let metrics = OperationMetrics::new("get", "device", 1, Instant::now());
        assert!(metrics.duration_us < 1_000_000);
        let instant = OperationMetrics { duration_us: 0, ..metrics };
        assert_eq!(instant.melems_per_sec(), 0.0);
    }
}
