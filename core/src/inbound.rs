//! Inbound stage: classify a transport outcome into a payload or a failure.
//!
//! Order matters:
//! 1. no response, or a status outside 200..=399, is a transport-level failure;
//! 2. an envelope with a success code resolves to its `data`, any other code
//!    is an application-level failure;
//! 3. anything else resolves to the body as-is.

use serde_json::Value;

use crate::envelope::{is_success_code, ResponseBody};
use crate::error::{ClientFailure, TransportError};
use crate::http::HttpResponse;

/// A response that made it through classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub status: u16,
    pub payload: Value,
}

pub fn classify(outcome: Result<HttpResponse, TransportError>) -> Result<Classified, ClientFailure> {
    let response = outcome?;
    if !response.is_success() {
        return Err(ClientFailure::Http {
            status: response.status,
            body: response.body,
        });
    }
    let status = response.status;
    match ResponseBody::from_text(&response.body) {
        ResponseBody::Envelope { code, data, .. } if is_success_code(code) => Ok(Classified {
            status,
            payload: data,
        }),
        ResponseBody::Envelope { code, message, .. } => Err(ClientFailure::Envelope {
            status,
            code,
            message,
        }),
        ResponseBody::Raw(payload) => Ok(Classified { status, payload }),
    }
}
