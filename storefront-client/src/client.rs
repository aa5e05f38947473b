//! Storefront client — the top-level request entry point.
//!
//! `StorefrontClient::request` sends a logical request, classifies the
//! response, and on an expired-authorization verdict renews the access token
//! at most once and replays the request at most once. Every outcome comes
//! back as an [`ApiResult`]; nothing protocol-level is thrown.

use crate::classify::classify;
use crate::config::{ClientConfig, ServiceTarget};
use crate::error::{ClientError, ClientResult};
use crate::refresh::{RenewalOutcome, SessionExpiredHook, TokenRefresher};
use crate::store::{StorageBackend, TokenStore};
use crate::token;
use crate::transport::{HttpTransport, Method, OutboundRequest, Transport};
use serde::Serialize;
use serde_json::Value;
use shared::auth::{CheckAvailabilityResponse, LoginRequest, RegisterRequest};
use shared::{ApiResult, AuthResponse, ErrorKind, UserInfo};
use std::sync::Arc;

// ============================================================================
// Request descriptor
// ============================================================================

/// A logical request plus its replay bookkeeping.
#[derive(Debug, Clone)]
struct RequestDescriptor {
    method: Method,
    target: ServiceTarget,
    path: String,
    body: Option<Value>,
    /// Set to true exactly once, before the single replay. A request that
    /// is rejected again after its replay is terminal.
    retried: bool,
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for the storefront services.
///
/// Cheap to clone; clones share the token store and the renewal slot.
///
/// # Example
///
/// ```no_run
/// use storefront_client::{ServiceTarget, StorefrontClient};
///
/// # async fn example() -> Result<(), storefront_client::ClientError> {
/// let client = StorefrontClient::builder()
///     .primary_url("https://shop.example.com/api")
///     .inference_url("https://ai.example.com")
///     .build()?;
///
/// let login = client.login("ada", "secret").await;
/// let products = client.get(ServiceTarget::Primary, "/products").await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    store: TokenStore,
    refresher: TokenRefresher,
}

impl std::fmt::Debug for StorefrontClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontClient")
            .field("store", &self.inner.store)
            .finish()
    }
}

impl StorefrontClient {
    /// Create a builder
    pub fn builder() -> StorefrontClientBuilder {
        StorefrontClientBuilder::new()
    }

    /// Create a client with default configuration and in-memory storage
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Self::builder().config(config).build()
    }

    /// The token store backing this client
    pub fn store(&self) -> &TokenStore {
        &self.inner.store
    }

    /// Cached user profile from the last successful login
    pub fn identity(&self) -> Option<UserInfo> {
        self.inner.store.identity()
    }

    /// True when an access token is stored
    pub fn is_authenticated(&self) -> bool {
        self.inner.store.access_token().is_some()
    }

    // ========================================================================
    // Request entry point
    // ========================================================================

    /// Issue a logical request and resolve it to a canonical result.
    ///
    /// On a 401 the access token is renewed (sharing any renewal already in
    /// flight) and the request replayed once; a second 401 is terminal. On
    /// renewal failure the stored session is cleared, the session-expired
    /// hook fires, and the result is an `AuthExpired` failure.
    pub async fn request(
        &self,
        method: Method,
        target: ServiceTarget,
        path: &str,
        body: Option<Value>,
    ) -> ApiResult<Value> {
        let mut descriptor = RequestDescriptor {
            method,
            target,
            path: path.to_string(),
            body,
            retried: false,
        };

        loop {
            let result = self.send_once(&descriptor).await;
            if result.kind() != Some(ErrorKind::AuthExpired) || descriptor.retried {
                return result;
            }
            match self.inner.refresher.renew().await {
                RenewalOutcome::Renewed => {
                    descriptor.retried = true;
                    tracing::debug!(path = %descriptor.path, "replaying with renewed token");
                }
                RenewalOutcome::Failed => {
                    return ApiResult::err(ErrorKind::AuthExpired, "Session expired");
                }
            }
        }
    }

    /// Send the descriptor once, attaching the access token when it is
    /// present and unexpired.
    async fn send_once(&self, descriptor: &RequestDescriptor) -> ApiResult<Value> {
        let bearer = self
            .inner
            .store
            .access_token()
            .filter(|t| !token::is_expired(t));
        let request = OutboundRequest {
            method: descriptor.method,
            target: descriptor.target,
            path: descriptor.path.clone(),
            body: descriptor.body.clone(),
            bearer,
        };
        classify(self.inner.transport.send(request).await)
    }

    // ========================================================================
    // Convenience wrappers
    // ========================================================================

    /// GET a path on a target service
    pub async fn get(&self, target: ServiceTarget, path: &str) -> ApiResult<Value> {
        self.request(Method::Get, target, path, None).await
    }

    /// POST a JSON body to a target service
    pub async fn post<B: Serialize + Sync>(
        &self,
        target: ServiceTarget,
        path: &str,
        body: &B,
    ) -> ApiResult<Value> {
        match serde_json::to_value(body) {
            Ok(value) => self.request(Method::Post, target, path, Some(value)).await,
            Err(err) => ApiResult::err(
                ErrorKind::Client,
                format!("failed to encode request body: {}", err),
            ),
        }
    }

    /// PUT a JSON body to a target service
    pub async fn put<B: Serialize + Sync>(
        &self,
        target: ServiceTarget,
        path: &str,
        body: &B,
    ) -> ApiResult<Value> {
        match serde_json::to_value(body) {
            Ok(value) => self.request(Method::Put, target, path, Some(value)).await,
            Err(err) => ApiResult::err(
                ErrorKind::Client,
                format!("failed to encode request body: {}", err),
            ),
        }
    }

    /// DELETE a path on a target service
    pub async fn delete(&self, target: ServiceTarget, path: &str) -> ApiResult<Value> {
        self.request(Method::Delete, target, path, None).await
    }

    // ========================================================================
    // Auth API
    // ========================================================================

    /// Login with a username or email.
    ///
    /// On success the token pair and the profile are persisted and the
    /// profile is returned.
    pub async fn login(&self, identifier: &str, password: &str) -> ApiResult<UserInfo> {
        let request = LoginRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };
        self.auth_call("/auth/login", &request).await
    }

    /// Register a new account. The backend logs the new user straight in,
    /// so success persists the session exactly like [`login`](Self::login).
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<UserInfo> {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.auth_call("/auth/register", &request).await
    }

    /// Check whether a username is still available
    pub async fn check_username(&self, username: &str) -> ApiResult<bool> {
        self.check_availability("/auth/check-username", serde_json::json!({ "username": username }))
            .await
    }

    /// Check whether an email is still available
    pub async fn check_email(&self, email: &str) -> ApiResult<bool> {
        self.check_availability("/auth/check-email", serde_json::json!({ "email": email }))
            .await
    }

    /// Drop the stored session. No server call is made.
    pub fn logout(&self) {
        self.inner.store.clear();
        tracing::info!("logged out, session cleared");
    }

    /// Auth endpoints answer with a typed envelope whose `user` field the
    /// unwrap table would mistake for a per-resource payload key, so they
    /// are parsed directly instead of going through normalization.
    async fn auth_call<B: Serialize + Sync>(&self, path: &str, body: &B) -> ApiResult<UserInfo> {
        let body = match serde_json::to_value(body) {
            Ok(value) => Some(value),
            Err(err) => {
                return ApiResult::err(
                    ErrorKind::Client,
                    format!("failed to encode request body: {}", err),
                );
            }
        };
        let request = OutboundRequest {
            method: Method::Post,
            target: ServiceTarget::Primary,
            path: path.to_string(),
            body,
            bearer: None,
        };

        let response = match self.inner.transport.send(request).await {
            Ok(response) => response,
            Err(err) => return ApiResult::err(ErrorKind::Network, err.to_string()),
        };
        if !response.is_success() {
            let failed = classify(Ok(response));
            return ApiResult {
                success: false,
                data: None,
                error: failed.error,
                message: failed.message,
            };
        }

        let parsed: AuthResponse = match serde_json::from_value(response.body) {
            Ok(parsed) => parsed,
            Err(err) => {
                return ApiResult::err(
                    ErrorKind::Server,
                    format!("malformed auth response: {}", err),
                );
            }
        };
        if !parsed.success {
            return ApiResult::err(
                ErrorKind::Server,
                parsed
                    .message
                    .unwrap_or_else(|| "Authentication failed".into()),
            );
        }

        if let Some(access) = &parsed.access_token {
            match &parsed.refresh_token {
                Some(refresh) => self.inner.store.set_tokens(access, refresh),
                None => self.inner.store.set_access_token(access),
            }
        }
        if let Some(user) = &parsed.user {
            self.inner.store.set_identity(user);
            tracing::info!(username = %user.username, "logged in");
        }

        match parsed.user {
            Some(user) => ApiResult {
                success: true,
                data: Some(user),
                error: None,
                message: parsed.message,
            },
            None => ApiResult::err(ErrorKind::Server, "auth response carried no user"),
        }
    }

    async fn check_availability(&self, path: &str, body: Value) -> ApiResult<bool> {
        self.request(Method::Post, ServiceTarget::Primary, path, Some(body))
            .await
            .map(|data| {
                serde_json::from_value::<CheckAvailabilityResponse>(data)
                    .map(|r| r.available)
                    .unwrap_or(false)
            })
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`StorefrontClient`].
///
/// # Example
///
/// ```no_run
/// use storefront_client::StorefrontClient;
///
/// let client = StorefrontClient::builder()
///     .primary_url("https://shop.example.com/api")
///     .on_session_expired(|| eprintln!("please log in again"))
///     .build()
///     .expect("failed to build client");
/// ```
#[derive(Default)]
pub struct StorefrontClientBuilder {
    config: ClientConfig,
    storage: Option<Arc<dyn StorageBackend>>,
    transport: Option<Arc<dyn Transport>>,
    on_session_expired: Option<SessionExpiredHook>,
}

impl StorefrontClientBuilder {
    /// Create a builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the primary service base URL
    pub fn primary_url(mut self, url: impl Into<String>) -> Self {
        self.config.primary_url = url.into();
        self
    }

    /// Set the inference service base URL
    pub fn inference_url(mut self, url: impl Into<String>) -> Self {
        self.config.inference_url = url.into();
        self
    }

    /// Use a custom storage backend (default: in-memory)
    pub fn storage(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(backend);
        self
    }

    /// Use a custom transport (default: [`HttpTransport`]); this is the
    /// seam tests use to substitute a fake network.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Subscribe to session expiry. Called at most once per failed renewal.
    pub fn on_session_expired(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the configuration is incomplete
    /// and [`ClientError::Http`] when the underlying HTTP client cannot be
    /// constructed.
    pub fn build(self) -> ClientResult<StorefrontClient> {
        if self.config.primary_url.is_empty() {
            return Err(ClientError::Config("primary_url is required".into()));
        }
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };
        let store = match self.storage {
            Some(backend) => TokenStore::new(backend),
            None => TokenStore::in_memory(),
        };
        let refresher = TokenRefresher::new(
            Arc::clone(&transport),
            store.clone(),
            self.on_session_expired,
        );
        Ok(StorefrontClient {
            inner: Arc::new(ClientInner {
                transport,
                store,
                refresher,
            }),
        })
    }
}
