//! Database row types. These map directly to SQLite rows and stay distinct
//! from the huddle-types API models, so the DB layer has no wire concerns.
//! Timestamps are fixed-width RFC 3339 UTC strings, so they sort lexically.

#[derive(Debug, Clone)]
pub struct MemberRow {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct TokenRow {
    pub key: String,
    pub member_id: String,
    pub created_at: String,
}

/// A token joined with the member that owns it.
#[derive(Debug, Clone)]
pub struct TokenWithMember {
    pub token: TokenRow,
    pub member: MemberRow,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub member_id: String,
    pub member_username: String,
    pub text: String,
    pub created_at: String,
}
