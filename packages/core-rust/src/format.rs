//! Content formatters used to encode and decode operation payloads.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

/// Encodes and decodes operation payloads for one content type.
pub trait ContentFormatter: Send + Sync {
    /// MIME type served and accepted, e.g. `application/json`.
    fn content_type(&self) -> &'static str;

    /// Short format name, e.g. `json`.
    fn extension(&self) -> &'static str;

    /// Encode a payload into bytes.
    fn encode(&self, value: &Value) -> anyhow::Result<Vec<u8>>;

    /// Decode bytes into a payload. An empty input decodes to `Value::Null`.
    fn decode(&self, bytes: &[u8]) -> anyhow::Result<Value>;
}

/// JSON payloads via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl ContentFormatter for JsonFormatter {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn encode(&self, value: &Value) -> anyhow::Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> anyhow::Result<Value> {
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// `MessagePack` payloads via `rmp-serde`. Maps are encoded with field names.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackFormatter;

impl ContentFormatter for MsgPackFormatter {
    fn content_type(&self) -> &'static str {
        "application/msgpack"
    }

    fn extension(&self) -> &'static str {
        "msgpack"
    }

    fn encode(&self, value: &Value) -> anyhow::Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> anyhow::Result<Value> {
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// Content-format settings of a host.
///
/// A default formatter is mandatory for a host to start; it is an `Option`
/// here so that a missing one is reported as a configuration error rather
/// than being impossible to express.
#[derive(Clone)]
pub struct ContentFormatConfig {
    default_formatter: Option<Arc<dyn ContentFormatter>>,
    formatters: Vec<Arc<dyn ContentFormatter>>,
}

impl ContentFormatConfig {
    /// A configuration with no formatters at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            default_formatter: None,
            formatters: Vec::new(),
        }
    }

    /// Sets the default formatter and registers it for its content type.
    #[must_use]
    pub fn with_default(mut self, formatter: Arc<dyn ContentFormatter>) -> Self {
        self.formatters.push(Arc::clone(&formatter));
        self.default_formatter = Some(formatter);
        self
    }

    /// Registers an additional formatter.
    #[must_use]
    pub fn with_formatter(mut self, formatter: Arc<dyn ContentFormatter>) -> Self {
        self.formatters.push(formatter);
        self
    }

    #[must_use]
    pub fn default_formatter(&self) -> Option<&Arc<dyn ContentFormatter>> {
        self.default_formatter.as_ref()
    }

    /// Picks the formatter for a `Content-Type` header value, ignoring
    /// parameters such as `charset`. Falls back to the default formatter.
    #[must_use]
    pub fn formatter_for(&self, content_type: Option<&str>) -> Option<&Arc<dyn ContentFormatter>> {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .filter(|ct| !ct.is_empty());

        match mime {
            Some(mime) => {
                let found = self
                    .formatters
                    .iter()
                    .find(|f| f.content_type().eq_ignore_ascii_case(mime));
                if found.is_none() {
                    debug!(content_type = mime, "no formatter registered, using default");
                }
                found.or(self.default_formatter.as_ref())
            }
            None => self.default_formatter.as_ref(),
        }
    }
}

impl Default for ContentFormatConfig {
    fn default() -> Self {
        Self::empty()
            .with_default(Arc::new(JsonFormatter))
            .with_formatter(Arc::new(MsgPackFormatter))
    }
}

impl fmt::Debug for ContentFormatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.formatters.iter().map(|f| f.content_type()).collect();
        f.debug_struct("ContentFormatConfig")
            .field(
                "default_formatter",
                &self.default_formatter.as_ref().map(|f| f.content_type()),
            )
            .field("formatters", &names)
            .finish()
    }
}
