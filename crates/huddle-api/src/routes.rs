use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::hello;
use crate::messages;
use crate::middleware::resolve_identity;

/// All API routes. Token authentication runs in front of every route; the
/// protected handlers additionally require a resolved identity.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/hello/", get(hello::hello))
        .route("/auth/register/", post(auth::register))
        .route("/auth/login/", post(auth::login))
        .route("/auth/logout/", post(auth::logout))
        .route("/auth/profile/", get(auth::get_profile).put(auth::update_profile))
        .route(
            "/chat/messages/",
            get(messages::get_messages).post(messages::send_message),
        )
        .layer(middleware::from_fn_with_state(state.clone(), resolve_identity))
        .with_state(state)
}
