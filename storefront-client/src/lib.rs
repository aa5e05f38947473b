//! Storefront Client - HTTP client layer for the storefront services
//!
//! Mediates every call the front end makes to the primary transactional API
//! and the inference service: attaches the access token, renews it through a
//! single-flight refresh when it expires, replays a rejected request at most
//! once, and folds every response into one canonical result shape.

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod refresh;
pub mod store;
pub mod token;
pub mod transport;

pub use client::{StorefrontClient, StorefrontClientBuilder};
pub use config::{ClientConfig, ServiceTarget};
pub use error::{ClientError, ClientResult};
pub use refresh::{RenewalOutcome, SessionExpiredHook, TokenRefresher};
pub use store::{FileStorage, MemoryStorage, StorageBackend, TokenStore};
pub use transport::{
    HttpTransport, Method, OutboundRequest, RawResponse, Transport, TransportError,
};

// Re-export shared types for convenience
pub use shared::{ApiResult, AuthResponse, ErrorKind, LoginRequest, RegisterRequest, UserInfo};
