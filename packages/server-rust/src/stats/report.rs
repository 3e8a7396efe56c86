//! The periodic stats reporting job.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use serde::Serialize;

use super::sink::StatsSink;
use super::{ServiceStats, StatsSnapshot};
use crate::worker::BackgroundRunnable;

/// One emitted report: framework version plus a stats snapshot.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsReport {
    pub framework_version: String,
    pub reported_at_ms: u64,
    pub stats: StatsSnapshot,
}

/// On-demand work for the stats worker.
#[derive(Debug)]
pub enum StatsTask {
    /// Emit a report immediately, outside the regular schedule.
    ReportNow,
}

/// Emits a [`StatsReport`] to a sink on every tick.
pub struct StatsReportJob {
    framework_version: &'static str,
    stats: Arc<ServiceStats>,
    sink: Arc<dyn StatsSink>,
    last_report: Arc<ArcSwapOption<StatsReport>>,
}

impl StatsReportJob {
    #[must_use]
    pub fn new(
        framework_version: &'static str,
        stats: Arc<ServiceStats>,
        sink: Arc<dyn StatsSink>,
        last_report: Arc<ArcSwapOption<StatsReport>>,
    ) -> Self {
        Self {
            framework_version,
            stats,
            sink,
            last_report,
        }
    }

    fn report(&self) {
        let reported_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);

        let report = StatsReport {
            framework_version: self.framework_version.to_string(),
            reported_at_ms,
            stats: self.stats.snapshot(),
        };
        self.sink.emit(&report);
        self.last_report.store(Some(Arc::new(report)));
    }
}

#[async_trait]
impl BackgroundRunnable for StatsReportJob {
    type Task = StatsTask;

    async fn run(&mut self, task: StatsTask) {
        match task {
            StatsTask::ReportNow => self.report(),
        }
    }

    async fn on_tick(&mut self) {
        self.report();
    }
}
