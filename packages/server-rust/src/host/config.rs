use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use svchost_core::ContentFormatConfig;

use crate::handler::{
    ExceptionHandler, MetadataRequestHandler, OperationRequestHandler, RequestHandler,
};
use crate::plugin::Plugin;
use crate::stats::{StatsSink, TracingStatsSink};

/// Interval between two scheduled stats reports.
pub const DEFAULT_STATS_REPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Redirect target for requests to the service root.
pub const DEFAULT_METADATA_PATH: &str = "~/metadata";

/// Host-level configuration: handler chain, plugins, exception handling,
/// content formats and stats reporting.
///
/// Plugins may extend the configuration while the host is being built;
/// afterwards it is read-only.
#[derive(Clone)]
pub struct HostConfig {
    /// Handlers consulted in order for every non-root request.
    pub request_handlers: Vec<Arc<dyn RequestHandler>>,
    /// Registration hooks run once, in order, during construction.
    pub plugins: Vec<Arc<dyn Plugin>>,
    /// Takes over when a handler fails. Without one, failures surface as
    /// `ProcessingError`.
    pub exception_handler: Option<Arc<dyn ExceptionHandler>>,
    pub content_format_config: ContentFormatConfig,
    /// Where requests to the service root are redirected.
    pub metadata_path: String,
    pub stats_report_interval: Duration,
    pub stats_sink: Arc<dyn StatsSink>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            request_handlers: vec![
                Arc::new(MetadataRequestHandler),
                Arc::new(OperationRequestHandler),
            ],
            plugins: Vec::new(),
            exception_handler: None,
            content_format_config: ContentFormatConfig::default(),
            metadata_path: DEFAULT_METADATA_PATH.to_string(),
            stats_report_interval: DEFAULT_STATS_REPORT_INTERVAL,
            stats_sink: Arc::new(TracingStatsSink),
        }
    }
}

impl fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConfig")
            .field("request_handlers", &self.request_handlers.len())
            .field("plugins", &self.plugins.len())
            .field("exception_handler", &self.exception_handler.is_some())
            .field("content_format_config", &self.content_format_config)
            .field("metadata_path", &self.metadata_path)
            .field("stats_report_interval", &self.stats_report_interval)
            .finish_non_exhaustive()
    }
}
