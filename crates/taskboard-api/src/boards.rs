use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use taskboard_types::api::{AddMemberRequest, BoardRequest};
use taskboard_types::models::Board;

use crate::error::{ApiError, Result};
use crate::middleware::AuthUser;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Board>>> {
    Ok(Json(state.boards.list()?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<BoardRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;
    let board = state.boards.create(&req.name, user.user_id)?;
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Board>> {
    let board = state.boards.get(id)?.ok_or(ApiError::NotFound("board"))?;
    Ok(Json(board))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<BoardRequest>, JsonRejection>,
) -> Result<Json<Board>> {
    let Json(req) = payload?;
    let board = state
        .boards
        .update(id, &req.name)?
        .ok_or(ApiError::NotFound("board"))?;
    Ok(Json(board))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    if !state.boards.delete(id)? {
        return Err(ApiError::NotFound("board"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /boards/{id}` links another user to the board.
pub async fn add_member(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<AddMemberRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(req) = payload?;
    state.boards.add_member(Some(id), req.user_id)?;
    Ok(StatusCode::CREATED)
}
