// Run metrics module
//
// Provides lightweight counters summarizing one capture run

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters for one capture run.
///
/// Uses atomic operations so the counters can be bumped from anywhere
/// without locks. Logged once at the end of the run.
#[derive(Debug)]
pub struct Metrics {
    /// Trace files moved into the output directory
    pub traces_moved: AtomicUsize,

    /// Interception traces successfully recompressed
    pub traces_compressed: AtomicUsize,

    /// Repack invocations that failed (the uncompressed file remains)
    pub repack_failures: AtomicUsize,

    /// Times the Steam client was force-killed
    pub client_kills: AtomicUsize,

    /// Run start time
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            traces_moved: AtomicUsize::new(0),
            traces_compressed: AtomicUsize::new(0),
            repack_failures: AtomicUsize::new(0),
            client_kills: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_traces_moved(&self, count: usize) {
        self.traces_moved.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_traces_compressed(&self, count: usize) {
        self.traces_compressed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_repack_failures(&self, count: usize) {
        self.repack_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_client_kill(&self) {
        self.client_kills.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total run time
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log run summary
    pub fn log_summary(&self) {
        tracing::info!("=== Capture Run Summary ===");
        tracing::info!("Run time: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Traces: {} moved, {} compressed, {} repack failure(s)",
            self.traces_moved.load(Ordering::Relaxed),
            self.traces_compressed.load(Ordering::Relaxed),
            self.repack_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Client kills issued: {}",
            self.client_kills.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.traces_moved.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.repack_failures.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_counters() {
        let metrics = Metrics::new();

        metrics.record_traces_moved(3);
        metrics.record_traces_compressed(2);
        metrics.record_repack_failures(1);
        metrics.record_client_kill();
        metrics.record_client_kill();

        assert_eq!(metrics.traces_moved.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.traces_compressed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.repack_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.client_kills.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_uptime() {
        let metrics = Metrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }
}
