//! The service host: construction, accessors and lifecycle.
//!
//! Construction order:
//!
//! 1. **Metadata** (`metadata`): operation registry built from the service
//!    definition
//! 2. **Validation**: the configuration must carry a default formatter
//! 3. **Plugins**: each plugin's `register` hook runs in configured order
//! 4. **Metadata redirect**: bound to the metadata path as plugins left it
//! 5. **Stats job**: periodic reporting is scheduled on a worker thread
//!
//! Request dispatch lives in `dispatch`.

pub mod config;
mod dispatch;
pub mod error;
pub mod metadata;

pub use config::{HostConfig, DEFAULT_METADATA_PATH, DEFAULT_STATS_REPORT_INTERVAL};
pub use error::{HostError, ProcessingError, ResponseError};
pub use metadata::{
    build_service_metadata, OperationDescription, OperationHandler, ServiceDescription,
    ServiceMetadata,
};

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use http::HeaderValue;
use parking_lot::Mutex;
use svchost_core::{ServiceDefinition, FRAMEWORK_VERSION};
use tracing::{debug, error, info};

use crate::handler::{NotFoundRequestHandler, RedirectRequestHandler};
use crate::stats::{ServiceStats, StatsReport, StatsReportJob, StatsTask};
use crate::worker::BackgroundWorker;

const STATS_WORKER_THREAD: &str = "svchost-stats";

/// Hosts one service implementation behind a handler chain.
///
/// Immutable after construction apart from the stats worker handle, so a
/// host can be shared (`Arc<ServiceHost>`) across request threads.
pub struct ServiceHost {
    config: HostConfig,
    service_metadata: Option<ServiceMetadata>,
    service_stats: Arc<ServiceStats>,
    redirect_metadata_handler: RedirectRequestHandler,
    fallback_handler: NotFoundRequestHandler,
    stats_worker: Mutex<Option<BackgroundWorker<StatsReportJob>>>,
    last_stats_report: Arc<ArcSwapOption<StatsReport>>,
}

impl ServiceHost {
    /// Hosts `service` with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`ServiceHost::with_config`].
    pub fn new<S: ServiceDefinition>(service: S) -> Result<Self, HostError> {
        Self::with_config(HostConfig::default(), service)
    }

    /// Hosts `service` with the given configuration.
    ///
    /// # Errors
    ///
    /// - `HostError::ContractViolation` if the service contract declares an
    ///   operation name twice
    /// - `HostError::Configuration` if the configuration is invalid
    /// - `HostError::PluginRegistration` if a plugin's hook fails
    /// - `HostError::StatsWorker` if the stats worker cannot be started
    pub fn with_config<S: ServiceDefinition>(
        config: HostConfig,
        service: S,
    ) -> Result<Self, HostError> {
        let service = Arc::new(service);
        let service_metadata = build_service_metadata(&service)?;
        let service_stats = Arc::new(ServiceStats::new(service_metadata.as_ref()));
        // Rebound after plugins run.
        let redirect_metadata_handler = RedirectRequestHandler::new(DEFAULT_METADATA_PATH, true);

        let mut host = Self {
            config,
            service_metadata,
            service_stats,
            redirect_metadata_handler,
            fallback_handler: NotFoundRequestHandler,
            stats_worker: Mutex::new(None),
            last_stats_report: Arc::new(ArcSwapOption::empty()),
        };

        host.validate_config()?;
        host.initialize_plugins()?;
        host.bind_metadata_redirect()?;
        host.schedule_stats_report()?;

        info!(
            service_type = S::type_name(),
            operations = host.service_metadata.as_ref().map_or(0, ServiceMetadata::operation_count),
            "service host started"
        );
        Ok(host)
    }

    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Mutable configuration, for plugins during registration.
    pub fn config_mut(&mut self) -> &mut HostConfig {
        &mut self.config
    }

    /// Metadata of the hosted service; `None` if it has no service contract.
    #[must_use]
    pub fn service_metadata(&self) -> Option<&ServiceMetadata> {
        self.service_metadata.as_ref()
    }

    #[must_use]
    pub fn service_stats(&self) -> &Arc<ServiceStats> {
        &self.service_stats
    }

    /// The most recent report emitted by the stats job.
    #[must_use]
    pub fn last_stats_report(&self) -> Option<Arc<StatsReport>> {
        self.last_stats_report.load_full()
    }

    #[must_use]
    pub fn is_stats_job_running(&self) -> bool {
        self.stats_worker
            .lock()
            .as_ref()
            .is_some_and(BackgroundWorker::is_running)
    }

    /// Asks the stats job for an immediate report.
    ///
    /// # Errors
    ///
    /// Returns an error if the host has been shut down.
    pub fn report_stats_now(&self) -> anyhow::Result<()> {
        match self.stats_worker.lock().as_ref() {
            Some(worker) => worker.submit(StatsTask::ReportNow),
            None => Err(anyhow::anyhow!("stats reporting has been stopped")),
        }
    }

    /// Stops the stats job. Request processing is unaffected. Idempotent;
    /// dropping the host has the same effect.
    pub fn shutdown(&self) {
        if let Some(mut worker) = self.stats_worker.lock().take() {
            worker.stop();
            info!("service host stats reporting stopped");
        }
    }

    fn validate_config(&self) -> Result<(), HostError> {
        let reason = if self.config.content_format_config.default_formatter().is_none() {
            "missing mandatory default content formatter in host config"
        } else if self.config.stats_report_interval.is_zero() {
            "stats report interval must be greater than zero"
        } else {
            return Ok(());
        };

        error!("{reason}");
        Err(HostError::Configuration {
            reason: reason.to_string(),
        })
    }

    fn initialize_plugins(&mut self) -> Result<(), HostError> {
        let plugins = self.config.plugins.clone();
        for plugin in &plugins {
            debug!(plugin = plugin.name(), "registering plugin");
            plugin.register(self).map_err(|e| {
                error!(plugin = plugin.name(), error = %e, "plugin registration failed");
                HostError::PluginRegistration(e)
            })?;
        }
        Ok(())
    }

    /// Points the root redirect at the configured metadata path. Runs after
    /// plugins, which may move it.
    fn bind_metadata_redirect(&mut self) -> Result<(), HostError> {
        let target = &self.config.metadata_path;
        let location = target.strip_prefix('~').unwrap_or(target);
        if target.is_empty() || HeaderValue::from_str(location).is_err() {
            let reason = format!("metadata path {target:?} is not a valid redirect target");
            error!("{reason}");
            return Err(HostError::Configuration { reason });
        }
        self.redirect_metadata_handler = RedirectRequestHandler::new(target.clone(), true);
        Ok(())
    }

    fn schedule_stats_report(&mut self) -> Result<(), HostError> {
        let job = StatsReportJob::new(
            FRAMEWORK_VERSION,
            Arc::clone(&self.service_stats),
            Arc::clone(&self.config.stats_sink),
            Arc::clone(&self.last_stats_report),
        );
        let worker = BackgroundWorker::start(
            job,
            self.config.stats_report_interval,
            STATS_WORKER_THREAD,
        )?;
        *self.stats_worker.get_mut() = Some(worker);
        Ok(())
    }
}

impl fmt::Debug for ServiceHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHost")
            .field("config", &self.config)
            .field("service_metadata", &self.service_metadata)
            .field("stats_job_running", &self.is_stats_job_running())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
