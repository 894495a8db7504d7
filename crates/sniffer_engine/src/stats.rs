use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the request counters. Safe to read mid-run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Requests issued, including every retry attempt.
    pub total_requests: u64,
    /// Requests that returned a usable body.
    pub successful_requests: u64,
    /// Requests that failed at the transport level (each attempt counts).
    pub failed_requests: u64,
    /// Attempts that were followed by a retry.
    pub retried_requests: u64,
    /// Page tasks that failed outside the transport (worker panic or
    /// similar). Kept separate from transport failures.
    pub task_failures: u64,
}

/// Shared counters, incremented by concurrent workers.
///
/// All counters are monotonically non-decreasing for the lifetime of an
/// engine instance; a fresh engine starts from zero.
#[derive(Debug, Default)]
pub struct RequestCounters {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
    task_failures: AtomicU64,
}

impl RequestCounters {
    pub fn record_attempt(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successful.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_failure(&self) {
        self.task_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a detached copy of the current counter values.
    pub fn snapshot(&self) -> RunStats {
        RunStats {
            total_requests: self.total.load(Ordering::Relaxed),
            successful_requests: self.successful.load(Ordering::Relaxed),
            failed_requests: self.failed.load(Ordering::Relaxed),
            retried_requests: self.retried.load(Ordering::Relaxed),
            task_failures: self.task_failures.load(Ordering::Relaxed),
        }
    }
}
