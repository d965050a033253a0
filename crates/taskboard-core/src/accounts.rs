use std::sync::Arc;

use chrono::Utc;
use taskboard_db::Database;
use taskboard_types::api::{Claims, TokenKind};
use taskboard_types::models::User;

use crate::error::{AuthError, CoreError, Result, required};
use crate::password;
use crate::session::{SessionKeys, SessionTokens};

/// Registration, credential checks and the session lifecycle.
pub struct AccountService {
    db: Arc<Database>,
    keys: SessionKeys,
}

impl AccountService {
    pub fn new(db: Arc<Database>, keys: SessionKeys) -> Self {
        Self { db, keys }
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    pub async fn register(&self, username: &str, password: &str, tg_name: Option<&str>) -> Result<User> {
        let username = required(username, "username")?;
        if password.trim().is_empty() {
            return Err(CoreError::validation("password is required"));
        }
        let tg_name = tg_name.map(str::trim).filter(|t| !t.is_empty());

        if self.db.get_user_by_username(username)?.is_some() {
            return Err(CoreError::conflict("username already taken"));
        }
        if let Some(tg) = tg_name {
            if self.db.get_user_by_tg_name(tg)?.is_some() {
                return Err(CoreError::conflict("tg_name already taken"));
            }
        }

        let hash = password::hash_password_blocking(password.to_string()).await?;
        // A concurrent registration can still win the race past the checks above.
        let row = self
            .db
            .create_user(username, &hash, tg_name, Utc::now())
            .map_err(|e| {
                if taskboard_db::is_constraint_violation(&e) {
                    CoreError::conflict("username or tg_name already taken")
                } else {
                    CoreError::from(e)
                }
            })?;

        tracing::info!(user_id = row.id, username = %row.username, "User registered");
        Ok(row.into())
    }

    /// Returns the user id. Unknown user and wrong password stay distinct here;
    /// the HTTP layer collapses them.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<i64> {
        let user = self
            .db
            .get_user_by_username(username.trim())?
            .ok_or(AuthError::UserNotFound)?;

        let ok = password::verify_password_blocking(password.to_string(), user.password_hash).await?;
        if !ok {
            return Err(AuthError::BadCredentials.into());
        }
        Ok(user.id)
    }

    /// Signs a fresh pair and stores the refresh token, replacing any older one.
    pub fn issue_session(&self, user_id: i64) -> Result<SessionTokens> {
        let tokens = self.keys.issue_pair(user_id, Utc::now())?;
        self.db.upsert_refresh_token(user_id, &tokens.refresh)?;
        Ok(tokens)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(i64, SessionTokens)> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(CoreError::validation("username and password are required"));
        }
        let user_id = self.authenticate(username, password).await?;
        let tokens = self.issue_session(user_id)?;
        tracing::info!(user_id, "User logged in");
        Ok((user_id, tokens))
    }

    pub fn verify_access(&self, token: Option<&str>) -> std::result::Result<Claims, AuthError> {
        self.keys.verify_access(token)
    }

    /// Trades a stored refresh token for a new access token.
    pub fn refresh(&self, refresh_token: Option<&str>) -> Result<String> {
        let token = refresh_token.ok_or(AuthError::Missing)?;
        let claims = self.keys.verify(token, TokenKind::Refresh)?;

        let stored = self.db.get_refresh_token(claims.sub)?;
        match stored {
            Some(row) if row.refresh_token == token => {
                self.keys.issue(claims.sub, TokenKind::Access, Utc::now())
            }
            _ => Err(AuthError::Revoked.into()),
        }
    }

    /// Drops the stored refresh token. Access tokens already out stay valid until expiry.
    pub fn logout(&self, user_id: i64) -> Result<()> {
        let removed = self.db.delete_refresh_token(user_id)?;
        tracing::info!(user_id, removed, "User logged out");
        Ok(())
    }

    pub fn me(&self, user_id: i64) -> Result<User> {
        self.db
            .get_user_by_id(user_id)?
            .map(User::from)
            .ok_or(CoreError::NotFound("user"))
    }

    /// Links a chat to the account whose `tg_name`, or failing that `username`,
    /// matches `handle`. Re-linking writes the same value again.
    pub fn link_chat(&self, handle: &str, chat_id: i64) -> Result<User> {
        let handle = required(handle, "tg_name")?;
        let mut user = self.resolve_handle(handle)?;

        self.db.set_chat_id(user.id, chat_id)?;
        user.chat_id = Some(chat_id);

        tracing::info!(user_id = user.id, chat_id, "Chat linked");
        Ok(user)
    }

    fn resolve_handle(&self, handle: &str) -> Result<User> {
        let row = self
            .db
            .find_user_by_handle(handle)?
            .ok_or(AuthError::UserNotFound)?;
        Ok(row.into())
    }
}
