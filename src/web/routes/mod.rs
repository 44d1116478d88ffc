//! Contains all the routes that this application can handle.

mod api;

// re-export errors
pub use api::subscribe::{DecodeError, NotificationError, SubscribeError, PERSIST_TIMEOUT};

use crate::AppState;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All the routes of the server
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/v1", api_routes(app_state))
        .route("/health-check", get(health_check))
}

/// API - Routes nested under "/v1" path
fn api_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/subscribe", post(api::subscribe))
        .with_state(app_state)
}
