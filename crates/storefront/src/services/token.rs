//! Bearer token issuance and validation.
//!
//! Tokens are HS256 JWTs carrying `{"user_id", "iat", "exp"}`. Access and
//! refresh tokens are signed with different keys, so a refresh token never
//! validates as an access token and vice versa. Refreshing does not rotate
//! or revoke the refresh token.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use shopipy_core::Email;

use crate::config::TokenConfig;

/// Token validation and signing failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Signature is valid but `exp` is in the past.
    #[error("token expired")]
    Expired,

    /// Not a decodable token, or its claims are unusable.
    #[error("malformed token")]
    Malformed,

    /// Signed with a different key.
    #[error("bad token signature")]
    BadSignature,

    /// Signing failed.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Which signing key a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the customer's email.
    pub user_id: String,
    /// Issued-at (seconds since epoch). Older tokens may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKey {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Issues and validates access and refresh tokens.
///
/// Built once from [`TokenConfig`] at start-up; immutable afterwards.
pub struct TokenService {
    access: SigningKey,
    refresh: SigningKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access.ttl)
            .field("refresh_ttl", &self.refresh.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service from the configured keys and lifetimes.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            access: SigningKey::new(config.access_secret.expose_secret(), config.access_ttl),
            refresh: SigningKey::new(config.refresh_secret.expose_secret(), config.refresh_ttl),
            validation,
        }
    }

    const fn key(&self, kind: TokenKind) -> &SigningKey {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Issue a token of the given kind for `subject`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if signing fails.
    pub fn issue(&self, kind: TokenKind, subject: &Email) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.key(kind).ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            user_id: subject.as_str().to_owned(),
            iat: Some(now),
            exp: now.saturating_add(ttl),
        };
        self.sign(kind, &claims)
    }

    /// Issue an access token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if signing fails.
    pub fn issue_access_token(&self, subject: &Email) -> Result<String, TokenError> {
        self.issue(TokenKind::Access, subject)
    }

    /// Issue a refresh token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if signing fails.
    pub fn issue_refresh_token(&self, subject: &Email) -> Result<String, TokenError> {
        self.issue(TokenKind::Refresh, subject)
    }

    /// Issue an access token and a refresh token for the same subject.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if signing fails.
    pub fn issue_pair(&self, subject: &Email) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(subject)?,
            refresh_token: self.issue_refresh_token(subject)?,
        })
    }

    /// Verify a token's signature and expiry against the key for `kind`.
    ///
    /// A token is valid while `now <= exp`.
    ///
    /// # Errors
    ///
    /// Returns `Expired`, `BadSignature`, or `Malformed`.
    pub fn validate(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.key(kind).decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            })
    }

    /// Validate an access token and return its subject.
    ///
    /// # Errors
    ///
    /// Returns a `TokenError` if the token is invalid or its subject is not
    /// an email address.
    pub fn authenticate(&self, token: &str) -> Result<Email, TokenError> {
        let claims = self.validate(token, TokenKind::Access)?;
        Email::parse(&claims.user_id).map_err(|_| TokenError::Malformed)
    }

    /// Exchange a valid refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns a `TokenError` if the refresh token is invalid.
    #[instrument(skip_all)]
    pub fn refresh(&self, refresh_token: &str) -> Result<String, TokenError> {
        let claims = self.validate(refresh_token, TokenKind::Refresh)?;
        let subject = Email::parse(&claims.user_id).map_err(|_| TokenError::Malformed)?;
        self.issue_access_token(&subject)
    }

    fn sign(&self, kind: TokenKind, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.key(kind).encoding,
        )
        .map_err(|e| TokenError::Encoding(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    const K1: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6v";
    const K2: &str = "Zc6^4Wu*0Tr&7Qp#5Ln@2Km!9Yx$3Ba8";

    fn service() -> TokenService {
        TokenService::new(&TokenConfig::new(
            SecretString::from(K1),
            SecretString::from(K2),
        ))
    }

    fn subject() -> Email {
        Email::parse("a@x.com").unwrap()
    }

    fn expired_claims() -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            user_id: "a@x.com".to_string(),
            iat: Some(now - 7200),
            exp: now - 60,
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let tokens = service();
        let token = tokens.issue_access_token(&subject()).unwrap();

        let claims = tokens.validate(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.user_id, "a@x.com");
        assert!(claims.exp > Utc::now().timestamp());
        assert_eq!(claims.exp - claims.iat.unwrap(), 3600);
    }

    #[test]
    fn test_refresh_token_ttl() {
        let tokens = service();
        let token = tokens.issue_refresh_token(&subject()).unwrap();

        let claims = tokens.validate(&token, TokenKind::Refresh).unwrap();
        assert_eq!(claims.exp - claims.iat.unwrap(), 86400);
    }

    #[test]
    fn test_expired_token() {
        let tokens = service();
        let token = tokens.sign(TokenKind::Access, &expired_claims()).unwrap();

        assert_eq!(
            tokens.validate(&token, TokenKind::Access),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_refresh_token_is_bad_signature_for_access() {
        let tokens = service();
        let token = tokens.issue_refresh_token(&subject()).unwrap();

        assert_eq!(
            tokens.validate(&token, TokenKind::Access),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        let tokens = service();
        assert_eq!(
            tokens.validate("not-a-token", TokenKind::Access),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_token_without_iat_is_accepted() {
        let tokens = service();
        let claims = Claims {
            user_id: "a@x.com".to_string(),
            iat: None,
            exp: Utc::now().timestamp() + 60,
        };
        let token = tokens.sign(TokenKind::Access, &claims).unwrap();

        assert_eq!(tokens.authenticate(&token).unwrap(), subject());
    }

    #[test]
    fn test_refresh_issues_valid_access_token() {
        let tokens = service();
        let refresh = tokens.issue_refresh_token(&subject()).unwrap();

        let access = tokens.refresh(&refresh).unwrap();
        assert_eq!(tokens.authenticate(&access).unwrap(), subject());
    }

    #[test]
    fn test_refresh_rejects_expired_refresh_token() {
        let tokens = service();
        let token = tokens.sign(TokenKind::Refresh, &expired_claims()).unwrap();

        assert_eq!(tokens.refresh(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_refresh_rejects_access_token() {
        let tokens = service();
        let access = tokens.issue_access_token(&subject()).unwrap();

        assert_eq!(tokens.refresh(&access), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_authenticate_rejects_non_email_subject() {
        let tokens = service();
        let claims = Claims {
            user_id: "not an email".to_string(),
            iat: None,
            exp: Utc::now().timestamp() + 60,
        };
        let token = tokens.sign(TokenKind::Access, &claims).unwrap();

        assert_eq!(tokens.authenticate(&token), Err(TokenError::Malformed));
    }
}
