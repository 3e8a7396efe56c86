//! axum adapter: serves a [`ServiceHost`] over HTTP.
//!
//! Every path is forwarded to `ServiceHost::process_request`. Dispatch is
//! synchronous, so each request runs on tokio's blocking pool with a fully
//! buffered body.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::host::ServiceHost;
use crate::transport::{HttpRequestWrapper, HttpResponseWrapper};

/// Largest request body accepted by the adapter.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Builds a router that sends every request to `host`.
///
/// Bodies over [`MAX_BODY_BYTES`] are rejected with 413 and bodies that fail
/// to read with 400, before the host sees the request.
pub fn build_router(host: Arc<ServiceHost>) -> Router {
    Router::new()
        .fallback(dispatch_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(host)
}

async fn dispatch_handler(
    State(host): State<Arc<ServiceHost>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut request = http::Request::new(body);
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.headers_mut() = headers;

    let outcome = tokio::task::spawn_blocking(move || {
        let mut request = HttpRequestWrapper::new(request);
        let mut response = HttpResponseWrapper::new();
        host.process_request(&mut request, &mut response)
            .map(|()| response.into_response())
    })
    .await;

    match outcome {
        Ok(Ok(Some(response))) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::from(body))
        }
        Ok(Ok(None)) => {
            error!("request completed without a response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Ok(Err(e)) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        Err(e) => {
            error!(error = %e, "dispatch task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
