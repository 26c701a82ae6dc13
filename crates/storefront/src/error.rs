//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error response is JSON: `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, CartError, CatalogError, OrderError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Signup/login failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog lookup failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Order placement failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing, malformed, or expired credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Known path, wrong method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a handler that needs an authenticated customer.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::Unauthorized("Authentication required".to_string())
    }

    /// HTTP status and client-facing message.
    ///
    /// Internal error details are never exposed to clients.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) => repository_response(err),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => {
                    (StatusCode::BAD_REQUEST, "Invalid email or password".into())
                }
                AuthError::UserAlreadyExists => (
                    StatusCode::CONFLICT,
                    "An account with this email already exists".into(),
                ),
                AuthError::MissingField(_) | AuthError::InvalidEmail(_) => {
                    (StatusCode::BAD_REQUEST, "Invalid form data".into())
                }
                AuthError::Repository(err) => repository_response(err),
                AuthError::PasswordHash => internal(),
            },
            Self::Cart(err) => match err {
                CartError::InvalidInput(_) => {
                    (StatusCode::BAD_REQUEST, "Invalid data format".into())
                }
                CartError::CustomerNotFound => user_not_found(),
                CartError::Conflict => cart_conflict(),
                CartError::Catalog(err) => catalog_response(err),
                CartError::Repository(err) => repository_response(err),
            },
            Self::Catalog(err) => catalog_response(err),
            Self::Order(err) => match err {
                OrderError::EmptyCart => (StatusCode::BAD_REQUEST, "Cart is empty".into()),
                OrderError::CustomerNotFound => user_not_found(),
                OrderError::Conflict => cart_conflict(),
                OrderError::Catalog(err) => catalog_response(err),
                OrderError::Repository(err) => repository_response(err),
            },
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed".into(),
            ),
            Self::Internal(_) => internal(),
        }
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".into(),
    )
}

fn user_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "User not found".into())
}

fn cart_conflict() -> (StatusCode, String) {
    (
        StatusCode::CONFLICT,
        "Cart was modified by another request, please retry".into(),
    )
}

fn repository_response(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".into()),
        RepositoryError::Conflict(_) => (StatusCode::CONFLICT, "Conflict".into()),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => internal(),
    }
}

fn catalog_response(err: &CatalogError) -> (StatusCode, String) {
    match err {
        CatalogError::ProductNotFound(_) | CatalogError::StockUnitNotFound { .. } => {
            (StatusCode::NOT_FOUND, "Product not found.".into())
        }
        CatalogError::InvalidFilter(_) => (StatusCode::BAD_REQUEST, "Invalid filter".into()),
        CatalogError::InvalidProduct(err) => (StatusCode::BAD_REQUEST, err.to_string()),
        CatalogError::Repository(err) => repository_response(err),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected query string");
        Self::BadRequest("Invalid query parameters".to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => {
                tracing::debug!(reason = %err.body_text(), "Rejected path parameters");
                Self::BadRequest("Invalid path parameters".to_string())
            }
            // Route and extractor disagree on the parameter names.
            other => Self::Internal(other.body_text()),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated customer.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(email.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for customer actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added stock unit", Some(&[("stock_id", "s1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
