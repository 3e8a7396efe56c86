use bytes::Bytes;
use http::StatusCode;

use super::RequestHandler;
use crate::host::{ServiceHost, ServiceMetadata};
use crate::transport::{HostRequest, HostResponse};

/// Serves `/metadata` as a JSON description of the hosted service.
///
/// Hosts without a service contract answer with `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataRequestHandler;

impl RequestHandler for MetadataRequestHandler {
    fn handle(
        &self,
        host: &ServiceHost,
        request: &mut dyn HostRequest,
        response: &mut dyn HostResponse,
    ) -> anyhow::Result<()> {
        let is_metadata = request
            .request_path()
            .is_some_and(|p| p.trim_matches('/').eq_ignore_ascii_case("metadata"));
        if !is_metadata {
            return Ok(());
        }

        let description = host.service_metadata().map(ServiceMetadata::describe);
        let body = serde_json::to_vec_pretty(&description)?;
        response.send_content(StatusCode::OK, "application/json", Bytes::from(body))?;
        Ok(())
    }
}
