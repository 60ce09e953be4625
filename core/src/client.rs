//! The transport client: one method per HTTP verb, with both interceptors
//! always applied.
//!
//! # Design
//! `ApiClient` holds only immutable configuration, a token provider and a
//! transport. Each call is split the same way the I/O-free core always was:
//! `build_request` produces an `HttpRequest` (outbound stage included) and
//! `parse_response` consumes the transport outcome (inbound stage included).
//! The async verb methods simply chain the two around `Transport::execute`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{normalize, ClientFailure, NormalizedError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::inbound::classify;
use crate::outbound::{intercept, NoToken, TokenProvider};
use crate::request::RequestConfig;
use crate::transport::{ReqwestTransport, Transport};

const DEFAULT_HEADERS: [(&str, &str); 2] = [
    ("Content-Type", "application/json"),
    ("Accept", "application/json, text/plain, */*"),
];

/// Asynchronous, stateless client for the market backend.
#[derive(Clone)]
pub struct ApiClient<T = ReqwestTransport> {
    config: ClientConfig,
    tokens: Arc<dyn TokenProvider>,
    transport: T,
}

impl ApiClient<ReqwestTransport> {
    /// Client over the default reqwest transport.
    pub fn with_config(config: ClientConfig) -> Self {
        Self::new(config, ReqwestTransport::new())
    }

    /// Client configured from the process environment.
    pub fn from_env() -> Self {
        Self::with_config(ClientConfig::from_env())
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            tokens: Arc::new(NoToken),
            transport,
        }
    }

    pub fn with_token_provider(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.tokens = Arc::new(provider);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<R, NormalizedError> {
        self.send::<R, ()>(HttpMethod::Get, path, None, config).await
    }

    pub async fn post<R: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<R, NormalizedError> {
        self.send(HttpMethod::Post, path, body, config).await
    }

    pub async fn put<R: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<R, NormalizedError> {
        self.send(HttpMethod::Put, path, body, config).await
    }

    pub async fn patch<R: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<R, NormalizedError> {
        self.send(HttpMethod::Patch, path, body, config).await
    }

    pub async fn delete<R: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<R, NormalizedError> {
        self.send::<R, ()>(HttpMethod::Delete, path, None, config).await
    }

    async fn send<R: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<R, NormalizedError> {
        let request = self.build_request(method, path, body, config)?;
        debug!(method = %request.method, url = %request.url, "sending request");
        let outcome = self.transport.execute(request.clone()).await;
        self.parse_response(&request, outcome)
    }

    /// Build the outgoing request, outbound stage included.
    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<HttpRequest, NormalizedError> {
        let built = self.construct(method, path, body, config);
        intercept(built, self.tokens.as_ref()).map_err(|failure| report(failure, path))
    }

    fn construct<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        config: RequestConfig,
    ) -> Result<HttpRequest, ClientFailure> {
        if let Some(reason) = config.error {
            return Err(ClientFailure::Build(reason));
        }
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ClientFailure::Build(format!("invalid request body: {e}")))?;

        let mut request = HttpRequest {
            method,
            url: self.config.url_for(path),
            path: path.to_string(),
            query: config.query,
            headers: Vec::new(),
            body,
            timeout: config.timeout.unwrap_or(self.config.timeout),
        };
        for (name, value) in DEFAULT_HEADERS {
            request.set_header(name, value);
        }
        for (name, value) in config.headers {
            request.set_header(&name, value);
        }
        Ok(request)
    }

    /// Turn a transport outcome for `request` into the caller's result,
    /// inbound stage included.
    pub fn parse_response<R: DeserializeOwned>(
        &self,
        request: &HttpRequest,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<R, NormalizedError> {
        let classified = classify(outcome).map_err(|failure| report(failure, &request.path))?;
        let status = classified.status;
        let payload = serde_json::from_value(classified.payload).map_err(|e| {
            report(
                ClientFailure::Decode {
                    status,
                    reason: e.to_string(),
                },
                &request.path,
            )
        })?;
        debug!(status, path = %request.path, "request resolved");
        Ok(payload)
    }
}

fn report(failure: ClientFailure, path: &str) -> NormalizedError {
    // The cause may carry detail the normalized message drops.
    let cause = failure.to_string();
    let err = normalize(failure, path);
    warn!(
        status = ?err.status,
        code = ?err.code,
        url = %path,
        message = %err.message,
        cause = %cause,
        "request failed"
    );
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::StaticToken;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tracing_test::traced_test;

    /// Transport that answers every request with the same canned outcome.
    struct Canned(Result<HttpResponse, TransportError>);

    impl Transport for Canned {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.0.clone()
        }
    }

    fn client() -> ApiClient<Canned> {
        ApiClient::new(
            ClientConfig::new("/api"),
            Canned(Ok(HttpResponse::new(200, "null"))),
        )
    }

    fn request(path: &str) -> HttpRequest {
        client()
            .build_request::<()>(HttpMethod::Get, path, None, RequestConfig::new())
            .unwrap()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Quote {
        f57: String,
        f58: String,
    }

    #[test]
    fn build_get_produces_correct_request() {
        let req = request("/stock");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "/api/stock");
        assert_eq!(req.path, "/stock");
        assert_eq!(req.timeout, Duration::from_millis(15000));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert!(req.header("authorization").is_none());
        assert!(req.body.is_none());
    }

    #[test]
    fn build_post_serializes_body() {
        let req = client()
            .build_request(
                HttpMethod::Post,
                "/scheduler/history",
                Some(&json!({"jobName": "kline"})),
                RequestConfig::new(),
            )
            .unwrap();
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["jobName"], "kline");
    }

    #[test]
    fn per_call_options_override_defaults() {
        let req = client()
            .build_request::<()>(
                HttpMethod::Get,
                "/stock",
                None,
                RequestConfig::new()
                    .header("content-type", "text/plain")
                    .timeout(Duration::from_millis(200))
                    .query("code", "600000"),
            )
            .unwrap();
        assert_eq!(req.header("Content-Type"), Some("text/plain"));
        assert_eq!(req.timeout, Duration::from_millis(200));
        assert_eq!(req.query, vec![("code".to_string(), "600000".to_string())]);
    }

    #[test]
    fn token_provider_is_applied() {
        let client = client().with_token_provider(StaticToken("t0k".to_string()));
        let req = client
            .build_request::<()>(HttpMethod::Delete, "/x", None, RequestConfig::new())
            .unwrap();
        assert_eq!(req.header("Authorization"), Some("Bearer t0k"));
    }

    #[test]
    fn construction_errors_are_normalized() {
        let err = client()
            .build_request::<()>(
                HttpMethod::Get,
                "/stock",
                None,
                RequestConfig::new().params(&"not an object"),
            )
            .unwrap_err();
        assert_eq!(err.status, None);
        assert_eq!(err.code, None);
        assert_eq!(err.url.as_deref(), Some("/stock"));
        assert!(!err.message.is_empty());
    }

    #[test]
    fn parse_unwraps_envelope() {
        let req = request("/stock");
        let quote: Quote = client()
            .parse_response(
                &req,
                Ok(HttpResponse::new(
                    200,
                    r#"{"code":0,"message":"ok","data":{"f57":"600000","f58":"浦发银行"}}"#,
                )),
            )
            .unwrap();
        assert_eq!(
            quote,
            Quote {
                f57: "600000".to_string(),
                f58: "浦发银行".to_string(),
            }
        );
    }

    #[test]
    fn parse_rejects_failure_envelope() {
        let req = request("/scheduler/jobs");
        let err = client()
            .parse_response::<Value>(
                &req,
                Ok(HttpResponse::new(200, r#"{"code":401,"message":"unauthorized"}"#)),
            )
            .unwrap_err();
        assert_eq!(err.status, Some(200));
        assert_eq!(err.code, Some(401));
        assert_eq!(err.message, "unauthorized");
        assert_eq!(err.url.as_deref(), Some("/scheduler/jobs"));
    }

    #[test]
    fn parse_http_500_plain_text() {
        let req = request("/stock");
        let err = client()
            .parse_response::<Value>(&req, Ok(HttpResponse::new(500, "Internal Server Error")))
            .unwrap_err();
        assert_eq!(err.status, Some(500));
        assert_eq!(err.code, None);
        assert_eq!(err.message, "HTTP 500");
    }

    #[test]
    fn parse_decode_failure_is_normalized() {
        let req = request("/stock");
        let err = client()
            .parse_response::<Quote>(&req, Ok(HttpResponse::new(200, r#"{"f57":1}"#)))
            .unwrap_err();
        assert_eq!(err.status, Some(200));
        assert!(err.message.starts_with("Failed to decode response"));
    }

    #[tokio::test]
    async fn connection_refused_has_no_status() {
        let client = ApiClient::new(
            ClientConfig::default(),
            Canned(Err(TransportError::Connect("refused".to_string()))),
        );
        let err = client
            .get::<Value>("/stock", RequestConfig::new())
            .await
            .unwrap_err();
        assert_eq!(err.status, None);
        assert_eq!(err.message, "Network error");
    }

    #[tokio::test]
    #[traced_test]
    async fn connection_cause_is_logged_but_not_returned() {
        let client = ApiClient::new(
            ClientConfig::default(),
            Canned(Err(TransportError::Connect(
                "tcp connect error: Connection refused (os error 111)".to_string(),
            ))),
        );
        let err = client
            .get::<Value>("/stock", RequestConfig::new())
            .await
            .unwrap_err();
        assert_eq!(err.message, "Network error");
        assert!(logs_contain("Connection refused (os error 111)"));
    }

    #[tokio::test]
    async fn relative_base_without_origin_is_reported() {
        let err = ApiClient::with_config(ClientConfig::default())
            .get::<Value>("/stock", RequestConfig::new())
            .await
            .unwrap_err();
        assert_eq!(err.status, None);
        assert_eq!(err.code, None);
        assert_eq!(err.url.as_deref(), Some("/stock"));
        assert!(err.message.contains("\"/api/stock\""), "{}", err.message);
        assert!(err.message.contains("relative URL without a base"), "{}", err.message);
    }

    #[tokio::test]
    async fn repeated_calls_are_independent() {
        let client = ApiClient::new(
            ClientConfig::default(),
            Canned(Ok(HttpResponse::new(200, r#"{"code":200,"message":"ok","data":{"n":1}}"#))),
        );
        let first: Value = client.get("/n", RequestConfig::new()).await.unwrap();
        let second: Value = client.get("/n", RequestConfig::new()).await.unwrap();
        assert_eq!(first, json!({"n": 1}));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn every_verb_goes_through_the_pipeline() {
        let client = ApiClient::new(
            ClientConfig::default(),
            Canned(Ok(HttpResponse::new(200, r#"{"ok":true}"#))),
        );
        let body = json!({"a": 1});
        let expected = json!({"ok": true});
        assert_eq!(client.get::<Value>("/v", RequestConfig::new()).await.unwrap(), expected);
        let resolved: Value = client
            .post("/v", Some(&body), RequestConfig::new())
            .await
            .unwrap();
        assert_eq!(resolved, expected);
        let resolved: Value = client
            .put("/v", Some(&body), RequestConfig::new())
            .await
            .unwrap();
        assert_eq!(resolved, expected);
        let resolved: Value = client
            .patch("/v", Some(&body), RequestConfig::new())
            .await
            .unwrap();
        assert_eq!(resolved, expected);
        assert_eq!(client.delete::<Value>("/v", RequestConfig::new()).await.unwrap(), expected);
    }
}
