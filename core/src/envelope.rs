//! Detection of the backend's optional `{code, message, data}` wrapper.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope codes that mean success.
pub const SUCCESS_CODES: [i64; 2] = [0, 200];

/// Code reported for a numeric `code` that is not a whole number.
pub const NON_INTEGRAL_CODE: i64 = -1;

/// The backend's response wrapper, for callers that build or inspect one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    pub message: String,
    pub data: T,
}

/// A decoded response body, tagged by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Envelope {
        code: i64,
        message: Option<String>,
        data: Value,
    },
    Raw(Value),
}

impl ResponseBody {
    /// Classify a decoded JSON body. Only an object with a numeric `code`
    /// counts as an envelope; bare payloads that happen to carry a string
    /// `code` (a stock code, say) are left alone.
    pub fn detect(value: Value) -> Self {
        match value {
            Value::Object(mut map) => match map.get("code").and_then(envelope_code) {
                Some(code) => {
                    let message = map
                        .remove("message")
                        .and_then(|m| m.as_str().map(str::to_string));
                    let data = map.remove("data").unwrap_or(Value::Null);
                    ResponseBody::Envelope {
                        code,
                        message,
                        data,
                    }
                }
                None => ResponseBody::Raw(Value::Object(map)),
            },
            other => ResponseBody::Raw(other),
        }
    }

    /// Parse response text. An empty body is JSON null; text that is not
    /// JSON is kept as a JSON string.
    pub fn from_text(body: &str) -> Self {
        if body.trim().is_empty() {
            return ResponseBody::Raw(Value::Null);
        }
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::detect(value),
            Err(_) => ResponseBody::Raw(Value::String(body.to_string())),
        }
    }
}

/// `200` and `200.0` are the same JSON number. Whole numbers beyond `i64`
/// saturate, and fractional ones map to [`NON_INTEGRAL_CODE`].
fn envelope_code(code: &Value) -> Option<i64> {
    let Value::Number(number) = code else {
        return None;
    };
    if let Some(code) = number.as_i64() {
        return Some(code);
    }
    if number.is_u64() {
        return Some(i64::MAX);
    }
    let float = number.as_f64()?;
    if float.fract() != 0.0 {
        return Some(NON_INTEGRAL_CODE);
    }
    // `as` saturates at the i64 bounds.
    Some(float as i64)
}

pub fn is_success_code(code: i64) -> bool {
    SUCCESS_CODES.contains(&code)
}
