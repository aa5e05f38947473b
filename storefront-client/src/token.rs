//! Access token expiry inspection
//!
//! Tokens are three-segment dot-delimited strings whose middle segment is a
//! base64url JSON object carrying an `exp` claim (seconds since epoch).
//! Anything that fails to decode is treated as expired, so a stale or
//! garbage token is never attached to a request.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns true when the token's `exp` claim has passed or cannot be read.
pub fn is_expired(token: &str) -> bool {
    match decode_expiry_ms(token) {
        Some(exp_ms) => now_ms() >= exp_ms,
        None => true,
    }
}

/// Decode the `exp` claim of a token, in milliseconds since epoch.
pub fn decode_expiry_ms(token: &str) -> Option<u64> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return None;
    }
    let payload = URL_SAFE_NO_PAD.decode(segments[1]).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&payload).ok()?;
    claims.get("exp")?.as_u64()?.checked_mul(1000)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
