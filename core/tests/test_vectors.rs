//! Verify response classification against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each vector describes a simulated transport outcome and either the
//! resolved payload or the normalized error it must produce. Comparing parsed
//! JSON (not raw strings) avoids false negatives from field ordering.

use std::time::Duration;

use market_core::{
    ApiClient, ClientConfig, HttpMethod, HttpRequest, HttpResponse, RequestConfig, TransportError,
    ReqwestTransport,
};
use serde_json::Value;

fn client() -> ApiClient {
    ApiClient::new(ClientConfig::new("/api"), ReqwestTransport::new())
}

fn request(c: &ApiClient, path: &str) -> HttpRequest {
    c.build_request::<()>(HttpMethod::Get, path, None, RequestConfig::new())
        .unwrap()
}

/// Rebuild the transport outcome a vector describes.
fn outcome(case: &Value) -> Result<HttpResponse, TransportError> {
    if let Some(err) = case.get("transport_error") {
        return Err(match err["kind"].as_str().unwrap() {
            "connect" => TransportError::Connect(err["detail"].as_str().unwrap().to_string()),
            "timeout" => TransportError::Timeout(Duration::from_millis(err["millis"].as_u64().unwrap())),
            "other" => TransportError::Other(err["detail"].as_str().unwrap().to_string()),
            other => panic!("unknown transport error kind: {other}"),
        });
    }
    let response = &case["response"];
    Ok(HttpResponse::new(
        response["status"].as_u64().unwrap() as u16,
        response["body"].as_str().unwrap(),
    ))
}

#[test]
fn classify_test_vectors() {
    let raw = include_str!("../../test-vectors/classify.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let path = vectors["path"].as_str().unwrap();

    let c = client();
    let req = request(&c, path);
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let result = c.parse_response::<Value>(&req, outcome(case));

        if let Some(expected) = case.get("expected_error") {
            let err = result.expect_err(name);
            assert_eq!(
                err.status.map(u64::from),
                expected.get("status").and_then(Value::as_u64),
                "{name}: status"
            );
            assert_eq!(
                err.code,
                expected.get("code").and_then(Value::as_i64),
                "{name}: code"
            );
            assert_eq!(err.message, expected["message"].as_str().unwrap(), "{name}: message");
            assert_eq!(err.url.as_deref(), Some(path), "{name}: url");
        } else {
            let payload = result.unwrap_or_else(|e| panic!("{name}: unexpected error {e:?}"));
            assert_eq!(payload, case["expected_result"], "{name}: payload");
        }
    }
}

#[test]
fn every_error_message_is_populated() {
    let raw = include_str!("../../test-vectors/classify.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    let req = request(&c, "/any");
    for case in vectors["cases"].as_array().unwrap() {
        if let Err(err) = c.parse_response::<Value>(&req, outcome(case)) {
            assert!(!err.message.trim().is_empty(), "{}", case["name"]);
        }
    }
}
