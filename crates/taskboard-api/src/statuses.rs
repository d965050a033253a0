use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use taskboard_types::api::StatusRequest;
use taskboard_types::models::Status;

use crate::error::Result;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Status>>> {
    Ok(Json(state.statuses.list()?))
}

pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<StatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;
    let status = state.statuses.create(&req.kind)?;
    Ok((StatusCode::CREATED, Json(status)))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    state.statuses.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
