use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use taskboard_types::api::{Claims, TokenKind};
use uuid::Uuid;

use crate::error::{AuthError, CoreError, Result};

pub const DEFAULT_ACCESS_TTL: Duration = Duration::minutes(15);
pub const DEFAULT_REFRESH_TTL: Duration = Duration::days(60);

/// HS256 signing material plus token lifetimes.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

/// Access and refresh token issued together at login.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access: String,
    pub refresh: String,
}

impl SessionKeys {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn with_default_ttls(secret: &str) -> Self {
        Self::new(secret, DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL)
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue(&self, user_id: i64, kind: TokenKind, now: DateTime<Utc>) -> Result<String> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id,
            kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp() as usize,
            exp: (now + ttl).timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| CoreError::Internal(format!("token signing failed: {e}")))
    }

    pub fn issue_pair(&self, user_id: i64, now: DateTime<Utc>) -> Result<SessionTokens> {
        Ok(SessionTokens {
            access: self.issue(user_id, TokenKind::Access, now)?,
            refresh: self.issue(user_id, TokenKind::Refresh, now)?,
        })
    }

    /// Checks signature, expiry and kind. A token of the other kind is malformed.
    pub fn verify(&self, token: &str, expected: TokenKind) -> std::result::Result<Claims, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::Missing);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::BadSignature,
            _ => AuthError::Malformed,
        })?;

        if data.claims.kind != expected {
            return Err(AuthError::Malformed);
        }
        Ok(data.claims)
    }

    pub fn verify_access(&self, token: Option<&str>) -> std::result::Result<Claims, AuthError> {
        self.verify(token.ok_or(AuthError::Missing)?, TokenKind::Access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> SessionKeys {
        SessionKeys::with_default_ttls("test-secret")
    }

    #[test]
    fn access_token_round_trip() {
        let token = keys().issue(7, TokenKind::Access, Utc::now()).unwrap();
        let claims = keys().verify_access(Some(&token)).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn refresh_lives_sixty_days() {
        let pair = keys().issue_pair(1, Utc::now()).unwrap();
        let claims = keys().verify(&pair.refresh, TokenKind::Refresh).unwrap();
        assert_eq!(claims.exp - claims.iat, 60 * 24 * 60 * 60);
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let now = Utc::now();
        let a = keys().issue(1, TokenKind::Access, now).unwrap();
        let b = keys().issue(1, TokenKind::Access, now).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let pair = keys().issue_pair(1, Utc::now()).unwrap();
        assert_eq!(keys().verify_access(Some(&pair.refresh)).unwrap_err(), AuthError::Malformed);
    }

    #[test]
    fn each_failure_is_classified() {
        assert_eq!(keys().verify_access(None).unwrap_err(), AuthError::Missing);
        assert_eq!(keys().verify_access(Some("")).unwrap_err(), AuthError::Missing);
        assert_eq!(
            keys().verify_access(Some("not.a.jwt")).unwrap_err(),
            AuthError::Malformed
        );

        let stale = keys()
            .issue(1, TokenKind::Access, Utc::now() - Duration::hours(1))
            .unwrap();
        assert_eq!(keys().verify_access(Some(&stale)).unwrap_err(), AuthError::Expired);

        let foreign = SessionKeys::with_default_ttls("other-secret")
            .issue(1, TokenKind::Access, Utc::now())
            .unwrap();
        assert_eq!(
            keys().verify_access(Some(&foreign)).unwrap_err(),
            AuthError::BadSignature
        );
    }
}
