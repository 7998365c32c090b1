//! Request/response transport abstraction
//!
//! The engine talks to the coordinator and to the field sensors through a
//! constrained, message-oriented protocol. That protocol is consumed here as
//! an opaque "send request, get response-or-timeout" primitive: a single
//! async call with an explicit per-request timeout, returning the raw reply
//! payload or a typed failure.
//!
//! Retry policy deliberately lives with the caller, not the transport. The
//! registration manager retries, discovery does not, reporting is
//! fire-and-forget; the trait stays policy-free.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Request method, mirroring the verbs the coordinator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        write!(f, "{}", s)
    }
}

/// A single outbound request.
///
/// `endpoint` is a resolved network address (base URI), `path` the resource
/// on that endpoint. The timeout bounds the whole exchange; a transport must
/// never block past it.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Resolved endpoint base URI (e.g. `http://[fd00::ab:1]:5683`)
    pub endpoint: String,

    /// Resource path on the endpoint (e.g. `/npk`)
    pub path: String,

    /// Request method
    pub method: Method,

    /// Optional request payload (JSON bytes)
    pub payload: Option<Vec<u8>>,

    /// Upper bound on the whole request/response exchange
    pub timeout: Duration,
}

impl TransportRequest {
    /// Build a GET request with no payload.
    pub fn get(endpoint: impl Into<String>, path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            path: path.into(),
            method: Method::Get,
            payload: None,
            timeout,
        }
    }

    /// Build a POST request carrying a payload.
    pub fn post(
        endpoint: impl Into<String>,
        path: impl Into<String>,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            path: path.into(),
            method: Method::Post,
            payload: Some(payload),
            timeout,
        }
    }
}

/// Transport failure taxonomy.
///
/// `Timeout` is the variant callers branch on: the registration manager
/// counts it against its attempt budget, the poller keeps stale data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("endpoint returned error status {0}")]
    Status(u16),

    #[error("invalid endpoint address: {0}")]
    InvalidEndpoint(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// The opaque request/response primitive.
///
/// Implementations must be safe to share across tasks. The engine ships an
/// HTTP binding; tests substitute scripted transports.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and await its reply payload, bounded by
    /// `req.timeout`.
    async fn request(&self, req: TransportRequest) -> Result<Vec<u8>>;
}
