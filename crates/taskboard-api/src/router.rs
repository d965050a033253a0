use axum::{
    Json, Router, middleware,
    routing::{delete, get, post},
};
use taskboard_types::api::HealthResponse;

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, boards, statuses, tasks};

/// All routes, with the auth layer on the protected half. Transport layers
/// (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/user/register", post(auth::register))
        .route("/user/login", post(auth::login))
        .route("/user/refresh", post(auth::refresh))
        // Service calls from the notification bot
        .route("/add-chat-id", post(auth::add_chat_id))
        .route("/send-tasks", post(auth::send_tasks));

    let protected_routes = Router::new()
        .route("/user", get(auth::me))
        .route("/user/logout", delete(auth::logout))
        .route("/boards", get(boards::list).post(boards::create))
        .route(
            "/boards/{id}",
            get(boards::get)
                .put(boards::update)
                .delete(boards::delete)
                .post(boards::add_member),
        )
        .route("/tasks", get(tasks::list).post(tasks::create))
        .route(
            "/tasks/{id}",
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
        .route("/status", get(statuses::list).post(statuses::create))
        .route("/status/{id}", delete(statuses::delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public_routes.merge(protected_routes).with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}
