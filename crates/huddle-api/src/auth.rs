use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, info};

use huddle_db::Database;
use huddle_types::api::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest};
use huddle_types::models::Member;

use crate::error::ApiError;
use crate::middleware::Authenticated;
use crate::password::Hasher;
use crate::session;
use crate::validation::{validate_login, validate_registration};
use crate::views::member_view;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub hasher: Hasher,
}

impl AppStateInner {
    pub fn new(db: Database, hasher: Hasher) -> AppState {
        Arc::new(Self { db, hasher })
    }
}

/// Run store and hashing work off the async runtime.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
        })?
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let new_member = validate_registration(&req)?;

    let member = run_blocking(&state, move |state| session::register(state, new_member)).await?;
    info!(member_id = %member.id, username = %member.username, "Member registered");

    Ok((StatusCode::CREATED, Json(member_view(&member))))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = payload?;
    let (username, password) = validate_login(&req)?;

    let (token, member) =
        run_blocking(&state, move |state| session::login(state, &username, &password)).await?;
    info!(member_id = %member.id, "Member logged in");

    Ok(Json(LoginResponse {
        token: token.key,
        member: member_view(&member),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> Result<StatusCode, ApiError> {
    let member_id = identity.member.id.clone();
    run_blocking(&state, move |state| session::logout(state, &identity.token)).await?;
    info!(member_id = %member_id, "Member logged out");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_profile(Authenticated(identity): Authenticated) -> Json<Member> {
    Json(member_view(&identity.member))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<Member>, ApiError> {
    let Json(req) = payload?;

    let member =
        run_blocking(&state, move |state| session::update_profile(state, &identity.member, &req))
            .await?;
    info!(member_id = %member.id, "Profile updated");

    Ok(Json(member_view(&member)))
}
