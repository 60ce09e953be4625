//! Outbound stage: bearer-token attachment.
//!
//! The token itself comes from an injected [`TokenProvider`]; acquiring or
//! refreshing tokens is up to whoever implements it.

use reqwest::header::{HeaderName, HeaderValue};

use crate::error::ClientFailure;
use crate::http::HttpRequest;

/// Source of the bearer token attached to outgoing requests.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Never supplies a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenProvider for NoToken {
    fn token(&self) -> Option<String> {
        None
    }
}

/// Always supplies the same token.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Run the outbound stage over a freshly built request.
///
/// `built` is the result of request construction; a construction failure is
/// passed through untouched so the caller normalizes it like any other.
pub fn intercept(
    built: Result<HttpRequest, ClientFailure>,
    tokens: &dyn TokenProvider,
) -> Result<HttpRequest, ClientFailure> {
    let mut request = built?;
    if let Some(token) = tokens.token().filter(|t| !t.is_empty()) {
        request.set_header("Authorization", format!("Bearer {token}"));
    }
    validate_headers(&request)?;
    Ok(request)
}

fn validate_headers(request: &HttpRequest) -> Result<(), ClientFailure> {
    for (name, value) in &request.headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientFailure::Build(format!("invalid header name {name:?}: {e}")))?;
        HeaderValue::from_str(value)
            .map_err(|e| ClientFailure::Build(format!("invalid value for header {name}: {e}")))?;
    }
    Ok(())
}
