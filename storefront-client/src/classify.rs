//! Response classification
//!
//! Folds transport failures, non-success statuses and the backend's varying
//! success envelopes into one canonical [`ApiResult`]. A 401 is classified
//! distinctly so the caller can run the renew-and-replay protocol.

use crate::transport::{RawResponse, TransportError};
use serde_json::Value;
use shared::{ApiResult, ErrorKind};

/// Payload keys consulted, in order, when unwrapping a success envelope.
///
/// The backend's resources disagree on where the actual payload lives:
/// paginated lists use `content`, single resources use a key named after
/// the resource. `data` sits right after `content` so an already-canonical
/// `{success, data}` body is a fixed point of normalization. Adding a
/// resource shape is an entry here, not new logic.
const UNWRAP_KEYS: &[&str] = &[
    "content", "data", "product", "products", "user", "cart", "order", "orders",
];

/// Classify a transport outcome into the canonical result shape.
pub fn classify(outcome: Result<RawResponse, TransportError>) -> ApiResult<Value> {
    match outcome {
        Err(err) => ApiResult::err(ErrorKind::Network, err.to_string()),
        Ok(response) => classify_response(response),
    }
}

fn classify_response(response: RawResponse) -> ApiResult<Value> {
    match response.status {
        401 => ApiResult::err(
            ErrorKind::AuthExpired,
            server_message(&response.body).unwrap_or_else(|| "Authorization expired".into()),
        ),
        status @ 400..=499 => ApiResult::err(
            ErrorKind::Client,
            server_message(&response.body).unwrap_or_else(|| format!("Request failed ({})", status)),
        ),
        status if !(200..300).contains(&status) => ApiResult::err(
            ErrorKind::Server,
            server_message(&response.body).unwrap_or_else(|| format!("Server error ({})", status)),
        ),
        _ => normalize(response.body),
    }
}

/// Pull a human-readable message out of an error body, if the server sent one.
fn server_message(body: &Value) -> Option<String> {
    if let Some(text) = body.as_str() {
        let trimmed = text.trim();
        return (!trimmed.is_empty()).then(|| trimmed.to_string());
    }
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Unwrap a 2xx body into the canonical shape.
fn normalize(body: Value) -> ApiResult<Value> {
    let Some(map) = body.as_object() else {
        // Bare payload (the inference service responds without an envelope).
        return ApiResult::ok(body);
    };
    if !map.contains_key("success") {
        return ApiResult::ok(body);
    }

    let success = map.get("success").and_then(Value::as_bool).unwrap_or(true);
    let message = map
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);
    if !success {
        // The server answered 2xx but voted failure inside the envelope.
        return ApiResult {
            success: false,
            data: None,
            error: Some(ErrorKind::Server),
            message: message.or_else(|| Some("Request rejected".into())),
        };
    }

    let data = UNWRAP_KEYS
        .iter()
        .find_map(|key| map.get(*key))
        .cloned()
        .unwrap_or_else(|| body.clone());
    ApiResult {
        success: true,
        data: Some(data),
        error: None,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok_response(body: Value) -> Result<RawResponse, TransportError> {
        Ok(RawResponse { status: 200, body })
    }

    #[test]
    fn test_transport_error_maps_to_network() {
        let result = classify(Err(TransportError("connection refused".into())));
        assert!(!result.is_ok());
        assert_eq!(result.kind(), Some(ErrorKind::Network));
    }

    #[test]
    fn test_401_is_classified_distinctly() {
        let result = classify(Ok(RawResponse {
            status: 401,
            body: Value::Null,
        }));
        assert_eq!(result.kind(), Some(ErrorKind::AuthExpired));
    }

    #[test]
    fn test_4xx_and_5xx_split() {
        let not_found = classify(Ok(RawResponse {
            status: 404,
            body: json!({ "message": "no such product" }),
        }));
        assert_eq!(not_found.kind(), Some(ErrorKind::Client));
        assert_eq!(not_found.message.as_deref(), Some("no such product"));

        let server = classify(Ok(RawResponse {
            status: 503,
            body: Value::String("maintenance".into()),
        }));
        assert_eq!(server.kind(), Some(ErrorKind::Server));
        assert_eq!(server.message.as_deref(), Some("maintenance"));
    }

    #[test]
    fn test_content_envelope_unwraps() {
        let result = classify(ok_response(json!({
            "success": true,
            "content": [1, 2, 3],
            "page": 0,
        })));
        assert!(result.is_ok());
        assert_eq!(result.data, Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_resource_key_envelope_unwraps() {
        let result = classify(ok_response(json!({
            "success": true,
            "user": { "id": 1, "username": "ada" },
        })));
        assert_eq!(result.data, Some(json!({ "id": 1, "username": "ada" })));

        let result = classify(ok_response(json!({
            "success": true,
            "product": { "id": 9 },
        })));
        assert_eq!(result.data, Some(json!({ "id": 9 })));
    }

    #[test]
    fn test_envelope_without_payload_key_falls_back_to_whole_body() {
        let body = json!({ "success": true, "message": "done", "count": 3 });
        let result = classify(ok_response(body.clone()));
        assert!(result.is_ok());
        assert_eq!(result.data, Some(body));
        assert_eq!(result.message.as_deref(), Some("done"));
    }

    #[test]
    fn test_bare_payload_is_wrapped() {
        let result = classify(ok_response(json!([{ "id": 1 }])));
        assert!(result.is_ok());
        assert_eq!(result.data, Some(json!([{ "id": 1 }])));
    }

    #[test]
    fn test_canonical_shape_is_a_fixed_point() {
        let first = classify(ok_response(json!({
            "success": true,
            "content": [1, 2, 3],
        })));
        let as_body = serde_json::to_value(&first).unwrap();
        let second = classify(ok_response(as_body));
        assert_eq!(second.success, first.success);
        assert_eq!(second.data, first.data);
    }

    #[test]
    fn test_2xx_envelope_with_failure_verdict() {
        let result = classify(ok_response(json!({
            "success": false,
            "message": "out of stock",
        })));
        assert!(!result.is_ok());
        assert_eq!(result.kind(), Some(ErrorKind::Server));
        assert_eq!(result.message.as_deref(), Some("out of stock"));
    }
}
