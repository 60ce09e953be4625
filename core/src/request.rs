//! Per-call request options.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

/// Options for a single call: query parameters, extra headers and a timeout
/// override.
///
/// Parameter serialization errors are held until the request is built so
/// they flow through the same normalization as every other failure.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) error: Option<String>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append query parameters from any serializable value. Objects become
    /// `key=value` pairs; `null` fields are skipped and arrays repeat the key.
    pub fn params<P: Serialize + ?Sized>(mut self, params: &P) -> Self {
        match serde_json::to_value(params) {
            Ok(Value::Object(map)) => {
                for (key, value) in map {
                    push_pairs(&mut self.query, &key, value);
                }
            }
            Ok(Value::Null) => {}
            Ok(other) => {
                self.error.get_or_insert_with(|| {
                    format!("query parameters must be an object, got {other}")
                });
            }
            Err(err) => {
                self.error
                    .get_or_insert_with(|| format!("invalid query parameters: {err}"));
            }
        }
        self
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

fn push_pairs(pairs: &mut Vec<(String, String)>, key: &str, value: Value) {
    match value {
        Value::Null => {}
        Value::String(s) => pairs.push((key.to_string(), s)),
        Value::Array(items) => {
            for item in items {
                push_pairs(pairs, key, item);
            }
        }
        other => pairs.push((key.to_string(), other.to_string())),
    }
}
