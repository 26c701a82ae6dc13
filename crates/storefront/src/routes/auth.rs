//! Signup, login, token refresh, and logout.
//!
//! Tokens are returned in the JSON body; clients send the access token back
//! as `Authorization: Bearer <token>`.

use axum::{
    Json,
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use shopipy_core::Email;

use super::JsonBody;
use crate::error::{AppError, Result, clear_sentry_user};
use crate::services::{AuthService, Signup, TokenPair};
use crate::state::AppState;

/// Cookies a browser client may hold from an earlier session.
const EXPIRED_TOKEN_COOKIES: [&str; 2] = [
    "access_token=\"\"; expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; Path=/",
    "refresh_token=\"\"; expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; Path=/",
];

/// Signup request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Refresh request body.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Token pair response for signup and login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub message: &'static str,
}

impl TokenResponse {
    fn new(pair: TokenPair, message: &'static str) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            message,
        }
    }
}

fn issue_pair(state: &AppState, email: &Email) -> Result<TokenPair> {
    state
        .tokens()
        .issue_pair(email)
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Register a customer and log them in.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SignupRequest>,
) -> Result<Json<TokenResponse>> {
    let customer = AuthService::new(state.store())
        .register(Signup {
            first_name: &body.first_name,
            last_name: &body.last_name,
            email: &body.email,
            password: &body.password,
        })
        .await?;

    let pair = issue_pair(&state, &customer.email)?;
    Ok(Json(TokenResponse::new(
        pair,
        "User registered and logged in successfully",
    )))
}

/// Exchange email and password for a token pair.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let customer = AuthService::new(state.store())
        .login(&body.email, &body.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;

    let pair = issue_pair(&state, &customer.email)?;
    Ok(Json(TokenResponse::new(pair, "User logged in successfully")))
}

/// Exchange a refresh token for a new access token.
///
/// The refresh token itself stays valid until it expires.
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RefreshRequest>,
) -> Result<impl IntoResponse> {
    let invalid = || AppError::Unauthorized("Invalid refresh token".to_string());

    let token = body.refresh_token.ok_or_else(invalid)?;
    let access_token = state.tokens().refresh(&token).map_err(|e| {
        tracing::debug!(error = %e, "Refresh rejected");
        invalid()
    })?;

    Ok(Json(json!({ "access_token": access_token })))
}

/// Expire the token cookies a browser client may hold.
///
/// Tokens are stateless; an issued token stays valid until it expires.
pub async fn logout() -> impl IntoResponse {
    clear_sentry_user();
    (
        AppendHeaders(EXPIRED_TOKEN_COOKIES.map(|cookie| (SET_COOKIE, cookie))),
        Json(json!({ "message": "Logout successful" })),
    )
}
