//! Fixtures shared by unit tests: a sample service, scripted handlers and a
//! request that counts body closes.

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use svchost_core::{
    ContractAttributes, MethodSignature, ServiceDefinition, ServiceInterface, ServiceMethod,
};

use crate::handler::{ExceptionHandler, RequestHandler};
use crate::host::ServiceHost;
use crate::transport::{HostRequest, HostResponse};

pub(crate) type CallLog = Arc<Mutex<Vec<String>>>;

// ---------------------------------------------------------------------------
// Sample services
// ---------------------------------------------------------------------------

pub(crate) fn calculator_contract() -> ServiceInterface {
    ServiceInterface::contract(
        "CalculatorContract",
        ContractAttributes {
            service_name: "CalculatorService",
            service_namespace: "http://example.com/calc",
            code_generator_version: "1.2.0",
        },
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct BinaryRequest {
    pub a: i64,
    pub b: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UnaryRequest {
    pub value: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ValueResponse {
    pub value: i64,
}

/// Contract: add, negate, divide, explode. Implemented: add, negate,
/// explode and the off-contract audit.
#[derive(Debug, Default)]
pub(crate) struct Calculator {
    pub offset: i64,
}

impl ServiceDefinition for Calculator {
    fn interfaces() -> Vec<ServiceInterface> {
        vec![
            ServiceInterface::plain("Auditable")
                .method(MethodSignature::typed::<UnaryRequest>("audit")),
            calculator_contract()
                .method(MethodSignature::typed::<BinaryRequest>("add"))
                .method(MethodSignature::typed::<UnaryRequest>("negate"))
                .method(MethodSignature::typed::<BinaryRequest>("divide"))
                .method(MethodSignature::typed::<UnaryRequest>("explode")),
        ]
    }

    fn methods() -> Vec<ServiceMethod<Self>> {
        vec![
            ServiceMethod::typed("add", |svc: &Self, req: BinaryRequest| {
                Ok(ValueResponse {
                    value: req.a + req.b + svc.offset,
                })
            }),
            ServiceMethod::typed("negate", |_: &Self, req: UnaryRequest| {
                Ok(ValueResponse { value: -req.value })
            }),
            ServiceMethod::typed(
                "explode",
                |_: &Self, _: UnaryRequest| -> anyhow::Result<ValueResponse> {
                    anyhow::bail!("explode always fails")
                },
            ),
            ServiceMethod::typed("audit", |_: &Self, req: UnaryRequest| {
                Ok(ValueResponse { value: req.value })
            }),
        ]
    }
}

/// Implements no contract interface.
#[derive(Debug)]
pub(crate) struct NoContractService;

impl ServiceDefinition for NoContractService {
    fn interfaces() -> Vec<ServiceInterface> {
        vec![ServiceInterface::plain("Closeable").method(MethodSignature::new("close", &[]))]
    }

    fn methods() -> Vec<ServiceMethod<Self>> {
        Vec::new()
    }
}

/// Declares `add` twice on its contract.
#[derive(Debug)]
pub(crate) struct DuplicateOperations;

impl ServiceDefinition for DuplicateOperations {
    fn interfaces() -> Vec<ServiceInterface> {
        vec![calculator_contract()
            .method(MethodSignature::typed::<BinaryRequest>("add"))
            .method(MethodSignature::typed::<UnaryRequest>("add"))]
    }

    fn methods() -> Vec<ServiceMethod<Self>> {
        vec![ServiceMethod::typed("add", |_: &Self, req: BinaryRequest| {
            Ok(ValueResponse { value: req.a + req.b })
        })]
    }
}

// ---------------------------------------------------------------------------
// Scripted handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    /// Do nothing, letting the chain continue.
    Pass,
    /// Send a 200 whose body is the handler name.
    Respond,
    Fail,
    Panic,
}

/// Appends its name to a shared log, then performs its step.
pub(crate) struct ScriptedHandler {
    name: &'static str,
    step: Step,
    log: CallLog,
}

impl ScriptedHandler {
    pub(crate) fn arc(name: &'static str, step: Step, log: &CallLog) -> Arc<dyn RequestHandler> {
        Arc::new(Self {
            name,
            step,
            log: Arc::clone(log),
        })
    }
}

impl RequestHandler for ScriptedHandler {
    fn handle(
        &self,
        _host: &ServiceHost,
        _request: &mut dyn HostRequest,
        response: &mut dyn HostResponse,
    ) -> anyhow::Result<()> {
        self.log.lock().push(self.name.to_string());
        match self.step {
            Step::Pass => Ok(()),
            Step::Respond => {
                response.send_content(StatusCode::OK, "text/plain", Bytes::from(self.name))?;
                Ok(())
            }
            Step::Fail => Err(anyhow::anyhow!("handler {} failed", self.name)),
            Step::Panic => panic!("handler {} panicked", self.name),
        }
    }
}

#[derive(Debug)]
pub(crate) struct ExceptionCall {
    pub path: Option<String>,
    pub error: String,
}

/// Records each failure and answers 503.
#[derive(Default)]
pub(crate) struct RecordingExceptionHandler {
    pub calls: Mutex<Vec<ExceptionCall>>,
}

impl ExceptionHandler for RecordingExceptionHandler {
    fn handle(
        &self,
        _host: &ServiceHost,
        request: &mut dyn HostRequest,
        response: &mut dyn HostResponse,
        error: &anyhow::Error,
    ) {
        self.calls.lock().push(ExceptionCall {
            path: request.request_path().map(str::to_owned),
            error: error.to_string(),
        });
        let _ = response.send_content(
            StatusCode::SERVICE_UNAVAILABLE,
            "text/plain",
            Bytes::from_static(b"unavailable"),
        );
    }
}

// ---------------------------------------------------------------------------
// RecordingRequest
// ---------------------------------------------------------------------------

/// Request whose body-close calls are counted.
pub(crate) struct RecordingRequest {
    path: Option<String>,
    base_path: String,
    method: Method,
    headers: HeaderMap,
    body: Option<Bytes>,
    closes: AtomicU32,
    fail_close: bool,
}

impl RecordingRequest {
    pub(crate) fn new(path: Option<&str>) -> Self {
        Self {
            path: path.map(str::to_owned),
            base_path: String::new(),
            method: Method::POST,
            headers: HeaderMap::new(),
            body: Some(Bytes::from_static(b"{}")),
            closes: AtomicU32::new(0),
            fail_close: false,
        }
    }

    pub(crate) fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = base_path.to_string();
        self
    }

    pub(crate) fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub(crate) fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub(crate) fn close_count(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }
}

impl HostRequest for RecordingRequest {
    fn request_path(&self) -> Option<&str> {
        self.path.as_deref()
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
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.body = None;
        if self.fail_close {
            return Err(io::Error::other("stream already broken"));
        }
        Ok(())
    }
}
