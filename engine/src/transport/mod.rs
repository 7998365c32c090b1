//! HTTP binding of the transport seam
//!
//! `HttpTransport` implements the opaque request/response primitive over
//! `reqwest`. The coordinator and the sensors both speak plain JSON over
//! HTTP in this deployment; everything protocol-specific stays behind the
//! `Transport` trait so the orchestration never sees it.
//!
//! Error mapping: reqwest timeouts become `TransportError::Timeout` (the
//! variant callers count attempts against), connect failures become
//! `Unreachable`, non-success statuses become `Status`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use sdk::transport::{Method, Result, Transport, TransportError, TransportRequest};

/// HTTP implementation of the transport primitive.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with its own connection pool.
    ///
    /// Per-request timeouts come from each `TransportRequest`; the client
    /// itself carries no global deadline.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    fn url(req: &TransportRequest) -> String {
        let base = req.endpoint.trim_end_matches('/');
        if req.path.starts_with('/') {
            format!("{}{}", base, req.path)
        } else {
            format!("{}/{}", base, req.path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, req: TransportRequest) -> Result<Vec<u8>> {
        let url = Self::url(&req);

        let mut builder = match req.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        builder = builder.timeout(req.timeout);

        if let Some(payload) = req.payload {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(payload);
        }

        tracing::debug!("{} {}", req.method, url);

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else if e.is_connect() {
                TransportError::Unreachable(url.clone())
            } else if e.is_builder() {
                TransportError::InvalidEndpoint(url.clone())
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(body.to_vec())
    }
}
