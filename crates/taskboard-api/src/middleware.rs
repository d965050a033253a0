use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use taskboard_core::AuthError;

use crate::auth::ACCESS_COOKIE;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, inserted into request extensions by `require_auth`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Validates the access token from `Authorization: Bearer`, falling back to
/// the `access_token` cookie when the header is absent.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match request.headers().get(header::AUTHORIZATION) {
        Some(value) => {
            let value = value.to_str().map_err(|_| AuthError::Malformed)?;
            let token = value.strip_prefix("Bearer ").ok_or(AuthError::Malformed)?;
            Some(token.to_string())
        }
        None => jar.get(ACCESS_COOKIE).map(|c| c.value().to_string()),
    };

    let claims = state.accounts.verify_access(token.as_deref())?;

    request.extensions_mut().insert(AuthUser { user_id: claims.sub });
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
