//! Request dispatch through the handler chain.
//!
//! 1. Root requests (`""`, `"/"` or no path) go to the metadata redirect
//! 2. Otherwise configured handlers are consulted in order until one sends
//! 3. If none sent, the not-found handler answers
//!
//! A failure in any step is handed to the exception handler, or surfaced as
//! `ProcessingError` when none is configured. The request body is closed
//! exactly once on every path, including unwinding.

use std::ops::{Deref, DerefMut};

use tracing::error;

use super::{ProcessingError, ServiceHost};
use crate::handler::RequestHandler;
use crate::transport::{HostRequest, HostResponse};

/// Closes the request body when dropped.
///
/// Close failures are discarded: no response state depends on them and
/// nothing downstream may rely on seeing them.
struct BodyGuard<'a> {
    request: &'a mut dyn HostRequest,
}

impl<'a> Deref for BodyGuard<'a> {
    type Target = dyn HostRequest + 'a;

    fn deref(&self) -> &Self::Target {
        self.request
    }
}

impl DerefMut for BodyGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.request
    }
}

impl Drop for BodyGuard<'_> {
    fn drop(&mut self) {
        let _ = self.request.close_body();
    }
}

impl ServiceHost {
    /// Routes one request through the handler chain.
    ///
    /// # Errors
    ///
    /// Returns `ProcessingError` if a handler fails and no exception handler
    /// is configured. In that case no response is guaranteed to have been
    /// sent.
    pub fn process_request(
        &self,
        request: &mut dyn HostRequest,
        response: &mut dyn HostResponse,
    ) -> Result<(), ProcessingError> {
        let mut request = BodyGuard { request };
        let path = request.request_path().map(str::to_owned);

        let Err(err) = self.dispatch(path.as_deref(), &mut *request, response) else {
            return Ok(());
        };

        if let Some(exception_handler) = &self.config.exception_handler {
            exception_handler.handle(self, &mut *request, response, &err);
            return Ok(());
        }

        let path = path.unwrap_or_default();
        error!(path = %path, error = %format!("{err:#}"), "error occurs when processing request");
        Err(ProcessingError {
            path,
            source: err.into(),
        })
    }

    fn dispatch(
        &self,
        path: Option<&str>,
        request: &mut dyn HostRequest,
        response: &mut dyn HostResponse,
    ) -> anyhow::Result<()> {
        if let None | Some("" | "/") = path {
            return self.redirect_metadata_handler.handle(self, request, response);
        }

        for handler in &self.config.request_handlers {
            handler.handle(self, request, response)?;
            if response.is_response_sent() {
                return Ok(());
            }
        }

        self.fallback_handler.handle(self, request, response)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
