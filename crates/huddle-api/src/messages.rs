use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;
use uuid::Uuid;

use huddle_db::Database;
use huddle_db::models::MessageRow;
use huddle_types::api::SendMessageRequest;
use huddle_types::models::ChatMessage;

use crate::auth::{AppState, run_blocking};
use crate::error::ApiError;
use crate::middleware::Authenticated;
use crate::validation::validate_message_text;
use crate::views::message_view;

/// Single group room: every authenticated member can read and post.
pub async fn send_message(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let text = validate_message_text(req.text.as_deref())?;

    // Author always comes from the token, never from the body
    let member_id = identity.member.id;
    let row = run_blocking(&state, move |state| post_message(&state.db, &member_id, &text)).await?;
    debug!(message_id = %row.id, member_id = %row.member_id, "Message posted");

    Ok((StatusCode::CREATED, Json(message_view(row))))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Authenticated(_identity): Authenticated,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let rows = run_blocking(&state, |state| Ok(state.db.list_messages_ordered_by_time()?)).await?;

    Ok(Json(rows.into_iter().map(message_view).collect()))
}

pub fn post_message(db: &Database, member_id: &str, text: &str) -> Result<MessageRow, ApiError> {
    let id = Uuid::new_v4().to_string();
    Ok(db.append_message(&id, member_id, text)?)
}
