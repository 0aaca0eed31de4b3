//! Registration, login/logout and profile updates.
//!
//! These functions are synchronous and talk to the store directly; handlers run
//! them through `run_blocking`.

use anyhow::anyhow;
use tracing::warn;
use uuid::Uuid;

use huddle_db::UniqueViolation;
use huddle_db::models::{MemberRow, TokenRow};
use huddle_types::api::UpdateProfileRequest;

use crate::auth::AppStateInner;
use crate::error::ApiError;
use crate::tokens::generate_token_key;
use crate::validation::{NewMember, validate_username};

/// Fresh keys are tried this many times if one collides with an existing key.
const MAX_KEY_ATTEMPTS: usize = 3;

pub fn register(state: &AppStateInner, new_member: NewMember) -> Result<MemberRow, ApiError> {
    // Fast path only; the UNIQUE constraint decides concurrent races
    if state.db.get_member_by_username(&new_member.username)?.is_some() {
        return Err(ApiError::DuplicateUsername);
    }

    let password_hash = state.hasher.hash(&new_member.password)?;
    let id = Uuid::new_v4().to_string();

    state
        .db
        .create_member(&id, &new_member.username, &password_hash)
        .map_err(username_conflict)
}

/// Verify credentials and issue a new token, revoking every earlier token of
/// the member. Unknown user and wrong password fail identically.
pub fn login(state: &AppStateInner, username: &str, password: &str) -> Result<(TokenRow, MemberRow), ApiError> {
    let Some(member) = state.db.get_member_by_username(username)? else {
        warn!("Login failed");
        return Err(ApiError::InvalidCredentials);
    };

    if !state.hasher.verify(password, &member.password_hash)? {
        warn!(member_id = %member.id, "Login failed");
        return Err(ApiError::InvalidCredentials);
    }

    for _ in 0..MAX_KEY_ATTEMPTS {
        let key = generate_token_key();
        match state.db.rotate_token(&member.id, &key) {
            Ok(token) => return Ok((token, member)),
            Err(e) if e.downcast_ref::<UniqueViolation>().is_some() => {
                warn!("Token key collision, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ApiError::Internal(anyhow!(
        "no unique token key after {} attempts",
        MAX_KEY_ATTEMPTS
    )))
}

/// Revoke one token. Revoking an already revoked token succeeds.
pub fn logout(state: &AppStateInner, token: &TokenRow) -> Result<(), ApiError> {
    state.db.delete_token(&token.key)?;
    Ok(())
}

/// Apply a profile update for `member`. Only the username is mutable;
/// `updated_at` is bumped even when nothing changes.
pub fn update_profile(
    state: &AppStateInner,
    member: &MemberRow,
    req: &UpdateProfileRequest,
) -> Result<MemberRow, ApiError> {
    let username = match req.username.as_deref() {
        Some(requested) => validate_username(requested)?,
        None => member.username.clone(),
    };

    if let Some(existing) = state.db.get_member_by_username(&username)? {
        if existing.id != member.id {
            return Err(ApiError::DuplicateUsername);
        }
    }

    state
        .db
        .update_member_username(&member.id, &username)
        .map_err(username_conflict)?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))
}

fn username_conflict(err: anyhow::Error) -> ApiError {
    if err.downcast_ref::<UniqueViolation>().is_some() {
        ApiError::DuplicateUsername
    } else {
        ApiError::Internal(err)
    }
}
