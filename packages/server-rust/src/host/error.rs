//! Error types for host construction and request processing.

/// Fatal errors raised while constructing a [`ServiceHost`](super::ServiceHost).
///
/// None of these are recoverable: the host is never created and the caller
/// must fix the service declaration or the configuration.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("invalid host config: {reason}")]
    Configuration { reason: String },
    #[error("duplicated method {operation} on service interface {service_type} is not allowed")]
    ContractViolation {
        operation: String,
        service_type: String,
    },
    /// Propagated unchanged from a plugin's registration hook.
    #[error(transparent)]
    PluginRegistration(anyhow::Error),
    #[error("failed to start stats reporting worker: {0}")]
    StatsWorker(#[from] std::io::Error),
}

/// A handler failed while processing a request and no exception handler
/// was configured to take over.
#[derive(Debug, thiserror::Error)]
#[error("error occurs when processing request {path}")]
pub struct ProcessingError {
    pub path: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

/// Errors from writing to a [`HostResponse`](crate::transport::HostResponse).
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("response has already been sent")]
    AlreadySent,
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}
