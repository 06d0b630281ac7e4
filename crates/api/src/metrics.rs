use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use judge::ErrorKind;

pub struct Metrics {
    // Counters
    total_runs: AtomicUsize,
    completed_runs: AtomicUsize,
    aborted_runs: AtomicUsize,
    aborted_by_kind: DashMap<ErrorKind, usize>,

    // Timing (in microseconds)
    total_run_time_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_runs: AtomicUsize::new(0),
            completed_runs: AtomicUsize::new(0),
            aborted_runs: AtomicUsize::new(0),
            aborted_by_kind: DashMap::new(),
            total_run_time_us: AtomicU64::new(0),
        })
    }

    pub fn record_completed(&self, duration: Duration) {
        self.total_runs.fetch_add(1, Ordering::Relaxed);
        self.completed_runs.fetch_add(1, Ordering::Relaxed);
        self.total_run_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_aborted(&self, duration: Duration, kind: ErrorKind) {
        self.total_runs.fetch_add(1, Ordering::Relaxed);
        self.aborted_runs.fetch_add(1, Ordering::Relaxed);
        self.total_run_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        *self.aborted_by_kind.entry(kind).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_runs = self.total_runs.load(Ordering::Relaxed);
        let total_us = self.total_run_time_us.load(Ordering::Relaxed) as f64;
        let avg_run_time_ms = if total_runs > 0 {
            total_us / total_runs as f64 / 1000.0
        } else {
            0.0
        };

        MetricsSnapshot {
            total_runs,
            completed_runs: self.completed_runs.load(Ordering::Relaxed),
            aborted_runs: self.aborted_runs.load(Ordering::Relaxed),
            aborted_by_kind: self
                .aborted_by_kind
                .iter()
                .map(|entry| (entry.key().as_str().to_string(), *entry.value()))
                .collect(),
            avg_run_time_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_runs: usize,
    pub completed_runs: usize,
    pub aborted_runs: usize,
    pub aborted_by_kind: BTreeMap<String, usize>,
    pub avg_run_time_ms: f64,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
