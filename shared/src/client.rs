//! Client-related types shared between server and client
//!
//! Request/response bodies of the auth API. Field names are camelCase on the
//! wire.

use serde::{Deserialize, Serialize};

use crate::models::{PublicUser, Role};

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signup request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub repeat_password: String,
    pub role: Role,
}

/// Refresh request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Access + refresh token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Login / refresh response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: TokenPair,
    pub user: PublicUser,
}
