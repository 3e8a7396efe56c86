//! Per-host service statistics and their periodic reporting.
//!
//! `ServiceStats` is updated concurrently by request handlers and read by the
//! stats reporting job. Counters are plain atomics; the per-operation map is
//! a `DashMap` so unknown operations can be added without a global lock.

pub mod report;
pub mod sink;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;

use crate::host::ServiceMetadata;

pub use report::{StatsReport, StatsReportJob, StatsTask};
pub use sink::{MetricsStatsSink, StatsSink, TracingStatsSink};

// ---------------------------------------------------------------------------
// ServiceStats
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct OperationStats {
    request_count: AtomicU64,
    failure_count: AtomicU64,
    total_latency_us: AtomicU64,
    max_latency_us: AtomicU64,
}

impl OperationStats {
    fn snapshot(&self, operation: &str) -> OperationSnapshot {
        let request_count = self.request_count.load(Ordering::Relaxed);
        let total_latency_us = self.total_latency_us.load(Ordering::Relaxed);
        OperationSnapshot {
            operation: operation.to_string(),
            request_count,
            failure_count: self.failure_count.load(Ordering::Relaxed),
            total_latency_us,
            max_latency_us: self.max_latency_us.load(Ordering::Relaxed),
            mean_latency_us: total_latency_us.checked_div(request_count).unwrap_or(0),
        }
    }
}

/// Aggregated request statistics for one service host.
#[derive(Debug)]
pub struct ServiceStats {
    service_name: String,
    operations: DashMap<String, OperationStats>,
}

impl ServiceStats {
    /// Creates the aggregate, pre-registering every known operation so idle
    /// operations are reported with zero counts.
    #[must_use]
    pub fn new(metadata: Option<&ServiceMetadata>) -> Self {
        let operations = DashMap::new();
        let mut service_name = String::new();
        if let Some(metadata) = metadata {
            service_name = metadata.service_name().to_string();
            for name in metadata.operation_names() {
                operations.insert(name.to_string(), OperationStats::default());
            }
        }
        Self {
            service_name,
            operations,
        }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Records one completed call of `operation`.
    pub fn record(&self, operation: &str, latency: Duration, success: bool) {
        let latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);

        if !self.operations.contains_key(operation) {
            self.operations.entry(operation.to_string()).or_default();
        }
        if let Some(stats) = self.operations.get(operation) {
            stats.request_count.fetch_add(1, Ordering::Relaxed);
            if !success {
                stats.failure_count.fetch_add(1, Ordering::Relaxed);
            }
            stats.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
            stats.max_latency_us.fetch_max(latency_us, Ordering::Relaxed);
        }
    }

    /// Point-in-time copy of all counters, sorted by operation name.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let mut operations: Vec<_> = self
            .operations
            .iter()
            .map(|entry| entry.value().snapshot(entry.key()))
            .collect();
        operations.sort_by(|a, b| a.operation.cmp(&b.operation));
        StatsSnapshot {
            service_name: self.service_name.clone(),
            operations,
        }
    }
}

/// Serializable copy of [`ServiceStats`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub service_name: String,
    pub operations: Vec<OperationSnapshot>,
}

impl StatsSnapshot {
    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.operations.iter().map(|op| op.request_count).sum()
    }

    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&OperationSnapshot> {
        self.operations.iter().find(|op| op.operation == name)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OperationSnapshot {
    pub operation: String,
    pub request_count: u64,
    pub failure_count: u64,
    pub total_latency_us: u64,
    pub max_latency_us: u64,
    pub mean_latency_us: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
