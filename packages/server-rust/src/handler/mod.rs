//! Request and exception handler interfaces, and the handlers the host
//! ships with.
//!
//! - [`redirect`]: redirects root requests to the metadata page
//! - [`not_found`]: fallback when no handler responded
//! - [`metadata`]: serves the service description
//! - [`operation`]: invokes registered operations
//! - [`exception`]: default exception handler writing a 500

pub mod exception;
pub mod metadata;
pub mod not_found;
pub mod operation;
pub mod redirect;

pub use exception::ErrorResponseHandler;
pub use metadata::MetadataRequestHandler;
pub use not_found::NotFoundRequestHandler;
pub use operation::OperationRequestHandler;
pub use redirect::RedirectRequestHandler;

use crate::host::ServiceHost;
use crate::transport::{HostRequest, HostResponse};

/// One entry of the host's handler chain.
///
/// A handler that does not recognise the request returns `Ok(())` without
/// sending; the dispatcher then consults the next handler.
pub trait RequestHandler: Send + Sync {
    /// # Errors
    ///
    /// Any error aborts the chain and is passed to the host's exception
    /// handler, if one is configured.
    fn handle(
        &self,
        host: &ServiceHost,
        request: &mut dyn HostRequest,
        response: &mut dyn HostResponse,
    ) -> anyhow::Result<()>;
}

/// Receives failures raised by request handlers during dispatch.
pub trait ExceptionHandler: Send + Sync {
    fn handle(
        &self,
        host: &ServiceHost,
        request: &mut dyn HostRequest,
        response: &mut dyn HostResponse,
        error: &anyhow::Error,
    );
}
