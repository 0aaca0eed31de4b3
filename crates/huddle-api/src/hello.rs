use axum::Json;

use huddle_types::api::HelloResponse;

pub async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello!".to_string(),
        timestamp: chrono::Utc::now(),
    })
}
