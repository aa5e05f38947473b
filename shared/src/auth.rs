//! Auth-related types shared across the client
//!
//! Request/response DTOs for the auth endpoints of the primary service.
//! Field names follow the backend's camelCase wire format.

use serde::{Deserialize, Serialize};

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
///
/// The backend accepts a username or an email in `identifier`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Token renewal request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response body of `/auth/login`, `/auth/register` and `/auth/refresh`.
///
/// Refresh responses carry no `user` and may omit the rotated
/// `refresh_token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

/// Response body of `/auth/check-username` and `/auth/check-email`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckAvailabilityResponse {
    pub available: bool,
}

/// User profile cached alongside the tokens.
///
/// Display data only; authorization decisions live in the tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
}
