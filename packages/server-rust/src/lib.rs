//! Service host: request dispatch through an ordered handler chain, an
//! operation registry built from a service contract, construction-time
//! plugins, and periodic stats reporting.

pub mod handler;
pub mod host;
pub mod network;
pub mod plugin;
pub mod stats;
pub mod transport;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use handler::{ExceptionHandler, RequestHandler};
pub use host::{HostConfig, HostError, ProcessingError, ServiceHost, ServiceMetadata};
pub use plugin::Plugin;
pub use stats::{ServiceStats, StatsSink};
pub use transport::{HostRequest, HostResponse, HttpRequestWrapper, HttpResponseWrapper};
