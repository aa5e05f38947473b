//! Transport boundary
//!
//! [`Transport`] is the thin, swappable seam between the client and the
//! network: it sends one fully-resolved request and reports what came back,
//! with no retry and no interpretation. [`HttpTransport`] is the production
//! implementation; tests substitute fakes.

use crate::config::{ClientConfig, ServiceTarget};
use crate::error::ClientResult;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

/// HTTP method of a logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// A fully-resolved outbound request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub target: ServiceTarget,
    /// Path relative to the target's base URL (e.g., "/products")
    pub path: String,
    /// JSON body, when present
    pub body: Option<Value>,
    /// Bearer token to attach, when present and unexpired
    pub bearer: Option<String>,
}

/// The wire-level response, untouched.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Parsed JSON body; `Value::String` for non-JSON text bodies,
    /// `Value::Null` when the body is empty.
    pub body: Value,
}

impl RawResponse {
    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport failure: no usable response was received.
#[derive(Debug, Clone, Error)]
#[error("Network error: {0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// One-shot request sender.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError>;
}

/// Network transport over reqwest.
///
/// Each target service gets its own `reqwest::Client` so the two timeout
/// budgets stay independent.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    primary: Client,
    inference: Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Build the transport from a configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let primary = Client::builder()
            .timeout(config.timeout(ServiceTarget::Primary))
            .build()?;
        let inference = Client::builder()
            .timeout(config.timeout(ServiceTarget::Inference))
            .build()?;
        Ok(Self {
            primary,
            inference,
            config: config.clone(),
        })
    }

    fn client(&self, target: ServiceTarget) -> &Client {
        match target {
            ServiceTarget::Primary => &self.primary,
            ServiceTarget::Inference => &self.inference,
        }
    }

    fn url(&self, target: ServiceTarget, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url(target).trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        let url = self.url(request.target, &request.path);
        tracing::debug!(method = request.method.as_str(), %url, "dispatching request");

        let client = self.client(request.target);
        let mut builder = match request.method {
            Method::Get => client.get(&url),
            Method::Post => client.post(&url),
            Method::Put => client.put(&url),
            Method::Delete => client.delete(&url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(bearer) = &request.bearer {
            builder = builder.header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", bearer),
            );
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(RawResponse { status, body })
    }
}
