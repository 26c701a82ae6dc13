//! Bearer-token auth gate and extractors.
//!
//! The gate runs on every request. A request without an `Authorization`
//! header passes through as a guest; a request with one must carry a valid
//! access token or is rejected with 401. Handlers that need a customer use
//! [`RequireAuth`], which turns a guest request into a 401 of its own.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Span;

use shopipy_core::Email;

use crate::error::{AppError, set_sentry_user};
use crate::services::TokenError;
use crate::state::AppState;

/// The authenticated customer's email, bound by [`auth_gate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject(pub Email);

/// Why a present `Authorization` header was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// Not exactly two whitespace-separated parts.
    InvalidFormat,
    /// First part is not `Bearer`.
    InvalidPrefix,
    /// Access token past its expiry.
    Expired,
    /// Bad signature or undecodable token.
    InvalidToken,
}

impl GateRejection {
    /// Message sent to the client.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidFormat => "Invalid authorization format",
            Self::InvalidPrefix => "Invalid token prefix",
            Self::Expired => "Token expired",
            Self::InvalidToken => "Invalid token",
        }
    }
}

impl From<TokenError> for GateRejection {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::Expired,
            TokenError::Malformed | TokenError::BadSignature | TokenError::Encoding(_) => {
                Self::InvalidToken
            }
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        AppError::Unauthorized(self.message().to_string()).into_response()
    }
}

/// Extract the token from an `Authorization` header value.
///
/// The value must be exactly `<prefix> <token>` with a case-insensitive
/// `bearer` prefix.
///
/// # Errors
///
/// Returns `InvalidFormat` or `InvalidPrefix`.
pub fn parse_bearer(value: &str) -> Result<&str, GateRejection> {
    let mut parts = value.split_whitespace();
    let (Some(prefix), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(GateRejection::InvalidFormat);
    };
    if !prefix.eq_ignore_ascii_case("bearer") {
        return Err(GateRejection::InvalidPrefix);
    }
    Ok(token)
}

/// Middleware that validates bearer tokens and binds the [`Subject`].
///
/// Never touches the store.
pub async fn auth_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return next.run(request).await;
    };

    let subject = header
        .to_str()
        .map_err(|_| GateRejection::InvalidFormat)
        .and_then(parse_bearer)
        .and_then(|token| state.tokens().authenticate(token).map_err(GateRejection::from));

    match subject {
        Ok(email) => {
            Span::current().record("customer", email.as_str());
            set_sentry_user(email.as_str());
            request.extensions_mut().insert(Subject(email));
            next.run(request).await
        }
        Err(rejection) => {
            tracing::debug!(reason = rejection.message(), "Bearer token rejected");
            rejection.into_response()
        }
    }
}

/// Extractor that requires an authenticated customer.
///
/// Guests get `401 {"error": "Authentication required"}`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(email): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {email}!")
/// }
/// ```
pub struct RequireAuth(pub Email);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Subject>()
            .map(|subject| Self(subject.0.clone()))
            .ok_or_else(AppError::unauthenticated)
    }
}
