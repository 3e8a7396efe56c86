//! Service host core: service contract declarations and content formatters.

pub mod contract;
pub mod format;

pub use contract::{
    ContractAttributes, Invoker, MethodSignature, ServiceDefinition, ServiceInterface,
    ServiceMethod,
};
pub use format::{ContentFormatConfig, ContentFormatter, JsonFormatter, MsgPackFormatter};
pub use serde_json::Value;

/// Version of the host framework, reported alongside service statistics.
pub const FRAMEWORK_VERSION: &str = env!("CARGO_PKG_VERSION");
