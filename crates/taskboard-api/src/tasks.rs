use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use taskboard_types::api::{CreateTaskRequest, UpdateTaskRequest};
use taskboard_types::models::Task;

use crate::error::{ApiError, Result};
use crate::middleware::AuthUser;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Task>>> {
    Ok(Json(state.tasks.list()?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;
    let task = state.tasks.create(user.user_id, &req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Task>> {
    let task = state.tasks.get(id)?.ok_or(ApiError::NotFound("task"))?;
    Ok(Json(task))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>> {
    let Json(req) = payload?;
    let task = state.tasks.update(id, &req)?.ok_or(ApiError::NotFound("task"))?;
    Ok(Json(task))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    if !state.tasks.delete(id)? {
        return Err(ApiError::NotFound("task"));
    }
    Ok(StatusCode::NO_CONTENT)
}
