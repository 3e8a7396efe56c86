//! Narrow request/response interfaces consumed by the dispatcher, plus
//! in-memory implementations over `http` types.
//!
//! The dispatcher only needs a request path, a closable body and a
//! "response sent" flag. Handlers additionally read headers and the body and
//! write a single response.

use std::io;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use http::{HeaderMap, Method, Request, Response, StatusCode};

use crate::host::ResponseError;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Inbound request as seen by the host and its handlers.
pub trait HostRequest: Send {
    /// Path relative to the service base path. `None` when unavailable.
    fn request_path(&self) -> Option<&str>;

    /// Mount point of the service, prepended when resolving `~/` targets.
    fn base_path(&self) -> &str {
        ""
    }

    fn method(&self) -> &Method;

    fn headers(&self) -> &HeaderMap;

    /// Request body, or `None` if absent or already closed.
    fn body(&self) -> Option<&Bytes>;

    /// Releases the request body. Called once by the dispatcher after every
    /// request.
    ///
    /// # Errors
    ///
    /// Implementations backed by real streams may fail to close them.
    fn close_body(&mut self) -> io::Result<()>;

    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }
}

/// Outbound response. At most one response may be sent per request.
pub trait HostResponse: Send {
    fn is_response_sent(&self) -> bool;

    /// Sends the response.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError::AlreadySent` if a response was already sent.
    fn send(
        &mut self,
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<(), ResponseError>;

    /// Sends a response with a single `Content-Type` header.
    ///
    /// # Errors
    ///
    /// See [`HostResponse::send`]; also fails if `content_type` is not a
    /// valid header value.
    fn send_content(
        &mut self,
        status: StatusCode,
        content_type: &str,
        body: Bytes,
    ) -> Result<(), ResponseError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
        self.send(status, headers, body)
    }

    /// Sends a redirect to `location`.
    ///
    /// # Errors
    ///
    /// See [`HostResponse::send`]; also fails if `location` is not a valid
    /// header value.
    fn redirect(&mut self, status: StatusCode, location: &str) -> Result<(), ResponseError> {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_str(location)?);
        self.send(status, headers, Bytes::new())
    }
}

// ---------------------------------------------------------------------------
// HttpRequestWrapper
// ---------------------------------------------------------------------------

/// [`HostRequest`] over a fully buffered `http::Request`.
#[derive(Debug)]
pub struct HttpRequestWrapper {
    method: Method,
    headers: HeaderMap,
    path: String,
    base_path: String,
    body: Option<Bytes>,
}

impl HttpRequestWrapper {
    #[must_use]
    pub fn new(request: Request<Bytes>) -> Self {
        Self::with_base_path(request, "")
    }

    /// Wraps a request for a service mounted under `base_path`; the prefix
    /// is stripped from the request path.
    #[must_use]
    pub fn with_base_path(request: Request<Bytes>, base_path: &str) -> Self {
        let (parts, body) = request.into_parts();
        let base_path = base_path.trim_end_matches('/').to_string();
        let full = parts.uri.path();
        let path = full
            .strip_prefix(base_path.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .unwrap_or(full)
            .to_string();

        Self {
            method: parts.method,
            headers: parts.headers,
            path,
            base_path,
            body: Some(body),
        }
    }

    #[must_use]
    pub fn is_body_closed(&self) -> bool {
        self.body.is_none()
    }
}

impl HostRequest for HttpRequestWrapper {
    fn request_path(&self) -> Option<&str> {
        Some(&self.path)
    }

    fn base_path(&self) -> &str {
        &self.base_path
    }

    fn method(&self) -> &Method {
        &self.method
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    fn close_body(&mut self) -> io::Result<()> {
        self.body = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HttpResponseWrapper
// ---------------------------------------------------------------------------

/// [`HostResponse`] that buffers the single response in memory.
#[derive(Debug, Default)]
pub struct HttpResponseWrapper {
    sent: Option<Response<Bytes>>,
}

impl HttpResponseWrapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.sent.as_ref().map(Response::status)
    }

    #[must_use]
    pub fn sent(&self) -> Option<&Response<Bytes>> {
        self.sent.as_ref()
    }

    /// Consumes the wrapper, returning the response if one was sent.
    #[must_use]
    pub fn into_response(self) -> Option<Response<Bytes>> {
        self.sent
    }
}

impl HostResponse for HttpResponseWrapper {
    fn is_response_sent(&self) -> bool {
        self.sent.is_some()
    }

    fn send(
        &mut self,
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<(), ResponseError> {
        if self.sent.is_some() {
            return Err(ResponseError::AlreadySent);
        }
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        self.sent = Some(response);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
