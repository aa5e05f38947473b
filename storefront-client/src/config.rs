//! Client configuration

use std::time::Duration;

/// Default base URL of the primary transactional API.
pub const DEFAULT_PRIMARY_URL: &str = "http://localhost:8080/api";

/// Default base URL of the inference service.
pub const DEFAULT_INFERENCE_URL: &str = "http://localhost:5000";

/// Which backend service a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceTarget {
    /// The transactional API (auth, catalog, cart, orders).
    #[default]
    Primary,
    /// The inference service (recommendations, chat). Calls may run model
    /// inference, so this target carries a longer timeout budget.
    Inference,
}

/// Client configuration for connecting to the storefront services.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Primary service base URL (e.g., "http://localhost:8080/api")
    pub primary_url: String,

    /// Inference service base URL (e.g., "http://localhost:5000")
    pub inference_url: String,

    /// Request timeout for the primary service
    pub primary_timeout: Duration,

    /// Request timeout for the inference service
    pub inference_timeout: Duration,
}

impl ClientConfig {
    /// Create a new configuration with default timeouts
    pub fn new(primary_url: impl Into<String>, inference_url: impl Into<String>) -> Self {
        Self {
            primary_url: primary_url.into(),
            inference_url: inference_url.into(),
            primary_timeout: Duration::from_secs(10),
            inference_timeout: Duration::from_secs(30),
        }
    }

    /// Load configuration from the environment.
    ///
    /// Honors `STOREFRONT_API_URL` and `STOREFRONT_AI_URL`; unset variables
    /// fall back to the defaults.
    pub fn from_env() -> Self {
        let primary =
            std::env::var("STOREFRONT_API_URL").unwrap_or_else(|_| DEFAULT_PRIMARY_URL.into());
        let inference =
            std::env::var("STOREFRONT_AI_URL").unwrap_or_else(|_| DEFAULT_INFERENCE_URL.into());
        Self::new(primary, inference)
    }

    /// Set the primary service base URL
    pub fn with_primary_url(mut self, url: impl Into<String>) -> Self {
        self.primary_url = url.into();
        self
    }

    /// Set the inference service base URL
    pub fn with_inference_url(mut self, url: impl Into<String>) -> Self {
        self.inference_url = url.into();
        self
    }

    /// Set the primary service timeout
    pub fn with_primary_timeout(mut self, timeout: Duration) -> Self {
        self.primary_timeout = timeout;
        self
    }

    /// Set the inference service timeout
    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = timeout;
        self
    }

    /// Base URL for a target service
    pub fn base_url(&self, target: ServiceTarget) -> &str {
        match target {
            ServiceTarget::Primary => &self.primary_url,
            ServiceTarget::Inference => &self.inference_url,
        }
    }

    /// Timeout budget for a target service
    pub fn timeout(&self, target: ServiceTarget) -> Duration {
        match target {
            ServiceTarget::Primary => self.primary_timeout,
            ServiceTarget::Inference => self.inference_timeout,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMARY_URL, DEFAULT_INFERENCE_URL)
    }
}
