use axum::{
    Extension, Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use taskboard_types::api::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest, UserResponse,
};
use taskboard_types::notify::ChatHandle;

use crate::error::{ApiError, Result};
use crate::middleware::AuthUser;
use crate::state::AppState;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

fn session_cookie(name: &'static str, value: String, ttl: chrono::Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build(name)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    cookie.make_removal();
    cookie
}

pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;

    let user = state
        .accounts
        .register(&req.username, &req.password, req.tg_name.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;

    let (user_id, tokens) = state.accounts.login(&req.username, &req.password).await?;
    let keys = state.accounts.keys();

    let jar = jar
        .add(session_cookie(ACCESS_COOKIE, tokens.access.clone(), keys.access_ttl()))
        .add(session_cookie(REFRESH_COOKIE, tokens.refresh, keys.refresh_ttl()));

    Ok((
        jar,
        Json(LoginResponse {
            user_id,
            access_token: tokens.access,
        }),
    ))
}

/// Accepts `{refresh_token}` in the body, or the refresh cookie when the body is empty.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let req: RefreshRequest = if body.is_empty() {
        RefreshRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadBody(e.to_string()))?
    };

    let token = req
        .refresh_token
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()));

    let access = state.accounts.refresh(token.as_deref())?;
    let jar = jar.add(session_cookie(
        ACCESS_COOKIE,
        access.clone(),
        state.accounts.keys().access_ttl(),
    ));

    Ok((jar, Json(RefreshResponse { access_token: access })))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = state.accounts.me(user.user_id)?;
    Ok(Json(user.into()))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    state.accounts.logout(user.user_id)?;

    // Sent even when the request carried no cookies (bearer-only clients).
    let jar = jar
        .add(removal_cookie(ACCESS_COOKIE))
        .add(removal_cookie(REFRESH_COOKIE));

    Ok((jar, StatusCode::NO_CONTENT))
}

// -- Bot service calls --

/// Links a chat to a user by messaging handle. Unknown handles are a 401.
pub async fn add_chat_id(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatHandle>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;
    let user = state.accounts.link_chat(&req.tg_name, req.chat_id)?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Queues the on-demand digest for one handle. The chat must be the one
/// linked through `/add-chat-id`; anything else is a 401.
pub async fn send_tasks(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatHandle>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(req) = payload?;
    state.digest.send_user_digest(&req.tg_name, req.chat_id)?;
    Ok(StatusCode::ACCEPTED)
}
