use bytes::Bytes;
use http::StatusCode;

use super::RequestHandler;
use crate::host::ServiceHost;
use crate::transport::{HostRequest, HostResponse};

/// Fallback handler: always answers 404.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFoundRequestHandler;

impl RequestHandler for NotFoundRequestHandler {
    fn handle(
        &self,
        _host: &ServiceHost,
        request: &mut dyn HostRequest,
        response: &mut dyn HostResponse,
    ) -> anyhow::Result<()> {
        let body = format!(
            "No handler found for {} {}",
            request.method(),
            request.request_path().unwrap_or_default()
        );
        response.send_content(
            StatusCode::NOT_FOUND,
            "text/plain; charset=utf-8",
            Bytes::from(body),
        )?;
        Ok(())
    }
}
