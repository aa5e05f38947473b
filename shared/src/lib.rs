//! Shared wire types for the storefront API boundary.
//!
//! Request/response DTOs and the canonical result shape used by
//! storefront-client. Pure data, no policy.

pub mod auth;
pub mod response;

pub use auth::{
    AuthResponse, CheckAvailabilityResponse, LoginRequest, RefreshRequest, RegisterRequest,
    UserInfo,
};
pub use response::{ApiResult, ErrorKind};
