use http::StatusCode;

use super::RequestHandler;
use crate::host::ServiceHost;
use crate::transport::{HostRequest, HostResponse};

/// Redirects every request it sees to a fixed target.
///
/// A target starting with `~/` is relative to the service base path.
#[derive(Debug, Clone)]
pub struct RedirectRequestHandler {
    target: String,
    permanent: bool,
}

impl RedirectRequestHandler {
    #[must_use]
    pub fn new(target: impl Into<String>, permanent: bool) -> Self {
        Self {
            target: target.into(),
            permanent,
        }
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    fn resolve(&self, base_path: &str) -> String {
        match self.target.strip_prefix('~') {
            Some(relative) if relative.starts_with('/') => {
                format!("{}{relative}", base_path.trim_end_matches('/'))
            }
            _ => self.target.clone(),
        }
    }
}

impl RequestHandler for RedirectRequestHandler {
    fn handle(
        &self,
        _host: &ServiceHost,
        request: &mut dyn HostRequest,
        response: &mut dyn HostResponse,
    ) -> anyhow::Result<()> {
        let location = self.resolve(request.base_path());
        let status = if self.permanent {
            StatusCode::MOVED_PERMANENTLY
        } else {
            StatusCode::FOUND
        };
        response.redirect(status, &location)?;
        Ok(())
    }
}
