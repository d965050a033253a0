/// Why a credential or token was refused. The HTTP edge reports every
/// variant as the same 401 so callers cannot tell which check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("No credentials supplied")]
    Missing,

    #[error("Malformed token")]
    Malformed,

    #[error("Token expired")]
    Expired,

    #[error("Token signature mismatch")]
    BadSignature,

    #[error("Refresh token revoked")]
    Revoked,

    #[error("User not found")]
    UserNotFound,

    #[error("Bad credentials")]
    BadCredentials,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CoreError::Conflict(msg.into())
    }
}

/// Trims a required text field, rejecting blanks.
pub(crate) fn required<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}
