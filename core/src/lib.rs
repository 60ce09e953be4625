//! Unified HTTP client layer for the market dashboard backend.
//!
//! # Overview
//! Every call goes through the same pipeline: the request is built, the
//! outbound stage attaches a bearer token, a [`Transport`] performs the I/O,
//! and the inbound stage classifies the outcome. Callers get either the
//! unwrapped payload or a [`NormalizedError`], never anything else.
//!
//! # Design
//! - `ApiClient` is stateless; it holds immutable configuration, a token
//!   provider and a transport.
//! - `build_request` / `parse_response` stay public so the pipeline ends can
//!   be driven without a network, the same split the verb methods use.
//! - Responses may or may not use the `{code, message, data}` envelope; the
//!   inbound stage detects it per response.
//! - Typed wrappers in [`api`] fix paths and payload types and add no error
//!   handling of their own.

pub mod api;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod inbound;
pub mod outbound;
pub mod request;
pub mod transport;
pub mod types;

pub use api::{SchedulerApi, StockApi};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use envelope::{ApiEnvelope, ResponseBody};
pub use error::{NormalizedError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use outbound::{NoToken, StaticToken, TokenProvider};
pub use request::RequestConfig;
pub use transport::{ReqwestTransport, Transport};
