use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Member;

// -- Hello --

#[derive(Debug, Serialize, Deserialize)]
pub struct HelloResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

// -- Auth --

// Fields are optional so that a missing field surfaces as a field-level
// validation error instead of a deserialization failure.

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub member: Member,
}

/// Partial or full public view of a member. `id`, `created_at` and
/// `updated_at` are accepted but read-only.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
}

// -- Chat --

/// Any author field a client sends is ignored; the author is always the
/// authenticated member.
#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    pub text: Option<String>,
}
