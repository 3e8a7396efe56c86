//! Destinations for stats reports.

use tracing::info;

use super::StatsReport;

/// Receives every emitted [`StatsReport`]. Called on the stats worker
/// thread; implementations must not block for long.
pub trait StatsSink: Send + Sync {
    fn emit(&self, report: &StatsReport);
}

/// Logs each report as a structured `tracing` event with a JSON payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatsSink;

impl StatsSink for TracingStatsSink {
    fn emit(&self, report: &StatsReport) {
        let payload = serde_json::to_string(report).unwrap_or_default();
        info!(
            target: "svchost::stats",
            framework_version = %report.framework_version,
            service = %report.stats.service_name,
            total_requests = report.stats.total_requests(),
            payload = %payload,
            "service stats report"
        );
    }
}

/// Publishes each report as gauges through the `metrics` facade.
///
/// Gauges are labelled with `service` and `operation`; whichever recorder
/// the process installs decides where they go.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsStatsSink;

impl StatsSink for MetricsStatsSink {
    #[allow(clippy::cast_precision_loss)]
    fn emit(&self, report: &StatsReport) {
        let service = report.stats.service_name.clone();
        for op in &report.stats.operations {
            let labels = [
                ("service", service.clone()),
                ("operation", op.operation.clone()),
            ];
            metrics::gauge!("svchost_operation_requests", &labels).set(op.request_count as f64);
            metrics::gauge!("svchost_operation_failures", &labels).set(op.failure_count as f64);
            metrics::gauge!("svchost_operation_latency_mean_us", &labels)
                .set(op.mean_latency_us as f64);
            metrics::gauge!("svchost_operation_latency_max_us", &labels)
                .set(op.max_latency_us as f64);
        }
    }
}
