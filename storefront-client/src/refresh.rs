//! Single-flight token renewal
//!
//! Any number of requests hitting a 401 at the same time must produce
//! exactly one call to the renewal endpoint: the endpoint invalidates the
//! refresh token on first use, so a second concurrent call would strand one
//! of the callers. The first arrival becomes the leader and performs the
//! renewal; everyone else attaches to the same settlement handle. The slot
//! is emptied before waiters are woken, so a request arriving after
//! settlement starts fresh instead of attaching to a finished renewal.

use crate::config::ServiceTarget;
use crate::store::TokenStore;
use crate::transport::{Method, OutboundRequest, Transport};
use shared::auth::{AuthResponse, RefreshRequest};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

/// Callback invoked when renewal fails and the session is over.
///
/// The client has no opinion on what happens next (redirect, modal, ...);
/// it only guarantees at most one invocation per failed renewal.
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// How a renewal settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalOutcome {
    /// A new access token is in the store.
    Renewed,
    /// Renewal failed; the store has been cleared.
    Failed,
}

type Settlement = watch::Receiver<Option<RenewalOutcome>>;

/// Coordinates access-token renewal across concurrent requests.
pub struct TokenRefresher {
    transport: Arc<dyn Transport>,
    store: TokenStore,
    on_session_expired: Option<SessionExpiredHook>,
    /// The single renewal slot: occupied while a renewal is in flight.
    inflight: Mutex<Option<Settlement>>,
}

impl TokenRefresher {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: TokenStore,
        on_session_expired: Option<SessionExpiredHook>,
    ) -> Self {
        Self {
            transport,
            store,
            on_session_expired,
            inflight: Mutex::new(None),
        }
    }

    /// Renew the access token, sharing any renewal already in flight.
    pub async fn renew(&self) -> RenewalOutcome {
        // Check-or-create is one atomic step: the lock covers the slot
        // inspection and the insertion, with no await in between.
        let (leader_tx, mut settlement) = {
            let mut slot = self.inflight.lock().await;
            match slot.as_ref() {
                Some(rx) => (None, rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    *slot = Some(rx.clone());
                    (Some(tx), rx)
                }
            }
        };

        let Some(tx) = leader_tx else {
            return self.await_settlement(&mut settlement).await;
        };

        let outcome = self.renew_inner().await;

        // Empty the slot before notifying, so requests arriving from here
        // on start a fresh renewal rather than observing this one.
        *self.inflight.lock().await = None;
        let _ = tx.send(Some(outcome));
        outcome
    }

    async fn await_settlement(&self, settlement: &mut Settlement) -> RenewalOutcome {
        loop {
            if let Some(outcome) = *settlement.borrow() {
                return outcome;
            }
            if settlement.changed().await.is_err() {
                // Leader dropped without settling; fail closed.
                return RenewalOutcome::Failed;
            }
        }
    }

    /// One renewal attempt against the primary service.
    async fn renew_inner(&self) -> RenewalOutcome {
        let Some(refresh_token) = self.store.refresh_token() else {
            tracing::warn!("no refresh token available, ending session");
            return self.expire_session();
        };

        let body = serde_json::to_value(RefreshRequest {
            refresh_token: refresh_token.clone(),
        })
        .ok();
        let request = OutboundRequest {
            method: Method::Post,
            target: ServiceTarget::Primary,
            path: "/auth/refresh".into(),
            body,
            bearer: None,
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("token renewal failed: {}", err);
                return self.expire_session();
            }
        };
        if !response.is_success() {
            tracing::warn!(status = response.status, "token renewal rejected");
            return self.expire_session();
        }

        let parsed: AuthResponse = match serde_json::from_value(response.body) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("malformed renewal response: {}", err);
                return self.expire_session();
            }
        };
        let Some(access) = parsed.access_token.filter(|_| parsed.success) else {
            tracing::warn!("renewal response carried no access token");
            return self.expire_session();
        };

        // Rotation is best-effort: keep the old refresh token when the
        // server does not issue a new one.
        match parsed.refresh_token {
            Some(rotated) => self.store.set_tokens(&access, &rotated),
            None => self.store.set_access_token(&access),
        }
        tracing::debug!("access token renewed");
        RenewalOutcome::Renewed
    }

    /// Fail closed: drop the stored session and notify the subscriber.
    fn expire_session(&self) -> RenewalOutcome {
        self.store.clear();
        if let Some(hook) = &self.on_session_expired {
            hook();
        }
        tracing::info!("session expired");
        RenewalOutcome::Failed
    }
}

impl std::fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("store", &self.store)
            .finish()
    }
}
