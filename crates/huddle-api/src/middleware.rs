//! Token authentication.
//!
//! [`resolve_identity`] runs in front of every route. It reads the
//! `Authorization` header and distinguishes three outcomes:
//!
//! - no header, or a scheme other than `Token`: the request continues without
//!   an identity (public routes still work, protected ones answer 401);
//! - a `Token` header that is malformed or names an unknown key: the request is
//!   rejected with 401 right away, whichever route it targets;
//! - a valid key: the owning member and token are attached to the request as
//!   an [`Identity`], which protected handlers demand via [`Authenticated`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use huddle_db::Database;
use huddle_db::models::{MemberRow, TokenRow};

use crate::auth::{AppState, run_blocking};
use crate::error::ApiError;

pub const TOKEN_SCHEME: &str = "Token";

/// Capability attached to a request whose bearer token resolved to a member.
#[derive(Debug, Clone)]
pub struct Identity {
    pub member: MemberRow,
    pub token: TokenRow,
}

/// Split `Authorization: <scheme> <credential>`.
///
/// Returns the trimmed credential for the `Token` scheme and `None` when the
/// header is absent or uses another scheme.
pub fn parse_authorization(header: Option<&str>) -> Result<Option<&str>, ApiError> {
    let Some(header) = header else {
        return Ok(None);
    };

    let (scheme, credential) = header.split_once(' ').ok_or(ApiError::MalformedCredential)?;
    if scheme.is_empty() || credential.is_empty() {
        return Err(ApiError::MalformedCredential);
    }

    // Case-sensitive; other schemes are left to coexist
    if scheme != TOKEN_SCHEME {
        return Ok(None);
    }

    let credential = credential.trim();
    if credential.is_empty() {
        return Err(ApiError::MalformedCredential);
    }

    Ok(Some(credential))
}

/// Look up a token key together with its member. One store round-trip, no
/// writes.
pub fn resolve_token(db: &Database, key: &str) -> Result<Identity, ApiError> {
    let found = db
        .get_token_by_key_with_member(key)?
        .ok_or(ApiError::InvalidCredential)?;

    Ok(Identity {
        member: found.member,
        token: found.token,
    })
}

/// Full authentication of one `Authorization` header value: `Ok(None)` when
/// the request stays unauthenticated, an error when it must be rejected.
pub fn authenticate(db: &Database, header: Option<&str>) -> Result<Option<Identity>, ApiError> {
    match parse_authorization(header)? {
        Some(key) => resolve_token(db, key).map(Some),
        None => Ok(None),
    }
}

pub async fn resolve_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| ApiError::MalformedCredential)?
                .to_string(),
        ),
        None => None,
    };

    // No header means no store access, so skip the blocking pool
    let identity = match header {
        Some(header) => {
            run_blocking(&state, move |state| authenticate(&state.db, Some(&header))).await?
        }
        None => None,
    };

    if let Some(identity) = identity {
        debug!(member_id = %identity.member.id, "Request authenticated");
        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}

/// Extractor for protected handlers. Rejects with 401 when the request carries
/// no resolved [`Identity`].
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Authenticated)
            .ok_or(ApiError::Unauthenticated)
    }
}
