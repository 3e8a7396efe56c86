//! Invokes registered operations.
//!
//! The last path segment names the operation. The request body is decoded
//! with the formatter matching its `Content-Type` (default formatter
//! otherwise), and the result is encoded with the same formatter.

use std::time::Instant;

use bytes::Bytes;
use http::StatusCode;
use tracing::debug;

use super::RequestHandler;
use crate::host::ServiceHost;
use crate::transport::{HostRequest, HostResponse};

#[derive(Debug, Clone, Copy, Default)]
pub struct OperationRequestHandler;

impl RequestHandler for OperationRequestHandler {
    fn handle(
        &self,
        host: &ServiceHost,
        request: &mut dyn HostRequest,
        response: &mut dyn HostResponse,
    ) -> anyhow::Result<()> {
        let Some(metadata) = host.service_metadata() else {
            return Ok(());
        };
        let Some(name) = request
            .request_path()
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty() && !p.contains('/'))
        else {
            return Ok(());
        };
        let Some(operation) = metadata.find_operation(name) else {
            return Ok(());
        };

        let formatter = host
            .config()
            .content_format_config
            .formatter_for(request.header("content-type"))
            .ok_or_else(|| anyhow::anyhow!("no content formatter available"))?;

        let payload = formatter.decode(request.body().map_or(&[][..], |b| &b[..]))?;

        let start = Instant::now();
        let result = operation.invoke(payload);
        host.service_stats()
            .record(operation.name(), start.elapsed(), result.is_ok());
        let output = result?;

        debug!(operation = operation.name(), "operation completed");

        let body = formatter.encode(&output)?;
        response.send_content(StatusCode::OK, formatter.content_type(), Bytes::from(body))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
