use bytes::Bytes;
use http::StatusCode;
use tracing::{error, warn};

use super::ExceptionHandler;
use crate::host::ServiceHost;
use crate::transport::{HostRequest, HostResponse};

/// Logs the failure and answers 500 with the error chain as plain text,
/// unless a response was already sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorResponseHandler;

impl ExceptionHandler for ErrorResponseHandler {
    fn handle(
        &self,
        _host: &ServiceHost,
        request: &mut dyn HostRequest,
        response: &mut dyn HostResponse,
        error: &anyhow::Error,
    ) {
        let path = request.request_path().unwrap_or_default();
        error!(path, error = %format!("{error:#}"), "request handler failed");

        if response.is_response_sent() {
            return;
        }
        let body = Bytes::from(format!("{error:#}"));
        if let Err(e) = response.send_content(
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/plain; charset=utf-8",
            body,
        ) {
            warn!(path, error = %e, "failed to send error response");
        }
    }
}
