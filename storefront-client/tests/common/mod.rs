// Shared test fixtures: token crafting and a fake transport.
#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use storefront_client::{OutboundRequest, RawResponse, Transport, TransportError};

/// Craft a three-segment token whose `exp` lies `offset_secs` from now.
/// The `sub` claim keeps tokens distinguishable in assertions.
pub fn make_token(offset_secs: i64, sub: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let payload = json!({ "sub": sub, "exp": now + offset_secs });
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(b"{\"alg\":\"HS256\"}"),
        URL_SAFE_NO_PAD.encode(payload.to_string()),
    )
}

struct FakeState {
    /// The bearer the protected endpoints currently accept.
    valid_bearer: String,
    /// The refresh token the renewal endpoint currently accepts.
    valid_refresh: String,
    refresh_calls: u32,
    protected_calls: u32,
    /// When false the renewal endpoint answers 500.
    refresh_ok: bool,
    /// When false no bearer is ever accepted (protected endpoints 401).
    accept_bearer: bool,
    /// Whether a successful renewal rotates the refresh token.
    rotate_refresh: bool,
}

/// Scriptable stand-in for the network.
///
/// Protected paths answer 200 with a `content` envelope for the currently
/// valid bearer and 401 otherwise. The renewal endpoint mints a new valid
/// bearer and invalidates the refresh token it consumed, like the real one.
pub struct FakeTransport {
    state: Mutex<FakeState>,
}

impl FakeTransport {
    pub fn new(initial_refresh: &str) -> Self {
        Self {
            state: Mutex::new(FakeState {
                valid_bearer: make_token(3600, "session-0"),
                valid_refresh: initial_refresh.to_string(),
                refresh_calls: 0,
                protected_calls: 0,
                refresh_ok: true,
                accept_bearer: true,
                rotate_refresh: true,
            }),
        }
    }

    pub fn failing_refresh(initial_refresh: &str) -> Self {
        let fake = Self::new(initial_refresh);
        fake.state.lock().unwrap().refresh_ok = false;
        fake
    }

    pub fn rejecting_all_bearers(initial_refresh: &str) -> Self {
        let fake = Self::new(initial_refresh);
        fake.state.lock().unwrap().accept_bearer = false;
        fake
    }

    pub fn without_rotation(initial_refresh: &str) -> Self {
        let fake = Self::new(initial_refresh);
        fake.state.lock().unwrap().rotate_refresh = false;
        fake
    }

    pub fn refresh_calls(&self) -> u32 {
        self.state.lock().unwrap().refresh_calls
    }

    pub fn protected_calls(&self) -> u32 {
        self.state.lock().unwrap().protected_calls
    }

    pub fn valid_bearer(&self) -> String {
        self.state.lock().unwrap().valid_bearer.clone()
    }

    pub fn valid_refresh(&self) -> String {
        self.state.lock().unwrap().valid_refresh.clone()
    }

    fn handle_refresh(&self, body: Option<&Value>) -> RawResponse {
        let mut state = self.state.lock().unwrap();
        state.refresh_calls += 1;
        if !state.refresh_ok {
            return RawResponse {
                status: 500,
                body: json!({ "message": "refresh rejected" }),
            };
        }
        let presented = body
            .and_then(|b| b.get("refreshToken"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if presented != state.valid_refresh {
            return RawResponse {
                status: 401,
                body: json!({ "message": "unknown refresh token" }),
            };
        }

        let renewed = make_token(3600, &format!("session-{}", state.refresh_calls));
        state.valid_bearer = renewed.clone();
        let mut response = json!({ "success": true, "accessToken": renewed });
        if state.rotate_refresh {
            let rotated = format!("refresh-{}", state.refresh_calls + 1);
            state.valid_refresh = rotated.clone();
            response["refreshToken"] = Value::String(rotated);
        }
        RawResponse {
            status: 200,
            body: response,
        }
    }

    fn handle_login(&self, body: Option<&Value>) -> RawResponse {
        let state = self.state.lock().unwrap();
        let identifier = body
            .and_then(|b| b.get("identifier"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let password = body
            .and_then(|b| b.get("password"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if password != "secret" {
            return RawResponse {
                status: 200,
                body: json!({ "success": false, "message": "Invalid credentials" }),
            };
        }
        RawResponse {
            status: 200,
            body: json!({
                "success": true,
                "accessToken": state.valid_bearer,
                "refreshToken": state.valid_refresh,
                "user": {
                    "id": 1,
                    "username": identifier,
                    "email": format!("{}@example.com", identifier),
                    "role": "USER",
                },
            }),
        }
    }

    fn handle_register(&self, body: Option<&Value>) -> RawResponse {
        let state = self.state.lock().unwrap();
        let username = body
            .and_then(|b| b.get("username"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let email = body
            .and_then(|b| b.get("email"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        RawResponse {
            status: 200,
            body: json!({
                "success": true,
                "message": "Account created",
                "accessToken": state.valid_bearer,
                "refreshToken": state.valid_refresh,
                "user": { "id": 2, "username": username, "email": email, "role": "USER" },
            }),
        }
    }

    fn handle_protected(&self, request: &OutboundRequest) -> RawResponse {
        let mut state = self.state.lock().unwrap();
        state.protected_calls += 1;
        let authorized = state.accept_bearer
            && request.bearer.as_deref() == Some(state.valid_bearer.as_str());
        if !authorized {
            return RawResponse {
                status: 401,
                body: Value::Null,
            };
        }
        match request.path.as_str() {
            // The inference service answers without an envelope.
            "/recommendations" => RawResponse {
                status: 200,
                body: json!([{ "id": 1 }, { "id": 2 }]),
            },
            _ => RawResponse {
                status: 200,
                body: json!({ "success": true, "content": [1, 2, 3] }),
            },
        }
    }

    /// Availability checks are open endpoints; no bearer required.
    fn handle_availability(&self, request: &OutboundRequest) -> RawResponse {
        let field = if request.path.ends_with("username") {
            "username"
        } else {
            "email"
        };
        let value = request
            .body
            .as_ref()
            .and_then(|b| b.get(field))
            .and_then(Value::as_str)
            .unwrap_or_default();
        RawResponse {
            status: 200,
            body: json!({ "success": true, "available": value != "taken" }),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        // Give concurrently-issued requests a chance to interleave, the way
        // real network calls do.
        tokio::task::yield_now().await;
        let response = match request.path.as_str() {
            "/auth/refresh" => self.handle_refresh(request.body.as_ref()),
            "/auth/login" => self.handle_login(request.body.as_ref()),
            "/auth/register" => self.handle_register(request.body.as_ref()),
            "/auth/check-username" | "/auth/check-email" => self.handle_availability(&request),
            _ => self.handle_protected(&request),
        };
        Ok(response)
    }
}
