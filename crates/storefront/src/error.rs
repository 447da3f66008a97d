//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; error bodies are JSON `{"error": ..., "fields": ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::cart::CartError;
use crate::checkout::{CheckoutError, ValidationErrors};
use crate::profile::{AvatarError, ProfileError};
use crate::services::auth::IdentityError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart operation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout transition rejected.
    #[error("Checkout error: {0}")]
    Checkout(CheckoutError),

    /// Submitted form is incomplete.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Identity provider operation failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Uploaded or generated avatar rejected.
    #[error("Avatar error: {0}")]
    Avatar(#[from] AvatarError),

    /// Visitor storage write failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body over the route's limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Avatar(err) => Self::Avatar(err),
            ProfileError::Storage(err) => Self::Storage(err),
            ProfileError::DisplayNameRequired => Self::Validation(ValidationErrors {
                fields: vec!["displayName"],
            }),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Validation(errors) => Self::Validation(errors),
            other => Self::Checkout(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<&'static str>>,
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Identity(err) => err.is_server_error(),
            Self::Storage(err) => !matches!(err, StorageError::QuotaExceeded { .. }),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cart(CartError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Cart(CartError::InvalidQuantity) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Checkout(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Identity(err) => match err {
                IdentityError::UserNotFound | IdentityError::WrongPassword => {
                    StatusCode::UNAUTHORIZED
                }
                IdentityError::EmailAlreadyInUse => StatusCode::CONFLICT,
                IdentityError::WeakPassword(_)
                | IdentityError::InvalidEmail
                | IdentityError::PopupClosed => StatusCode::BAD_REQUEST,
                IdentityError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                IdentityError::Transport(_)
                | IdentityError::Provider { .. }
                | IdentityError::Parse(_) => StatusCode::BAD_GATEWAY,
                IdentityError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Avatar(AvatarError::TooLarge { .. }) | Self::PayloadTooLarge(_) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::Avatar(_) => StatusCode::BAD_REQUEST,
            Self::Storage(StorageError::QuotaExceeded { .. }) => StatusCode::INSUFFICIENT_STORAGE,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn body(&self) -> ErrorBody {
        // Don't expose internal error details to clients
        let error = match self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Identity(err) => err.user_message(),
            Self::Storage(StorageError::QuotaExceeded { .. }) => {
                "Not enough storage space to save this".to_string()
            }
            Self::Storage(_) => "Internal server error".to_string(),
            Self::Cart(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::Avatar(err) => err.to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::Unauthorized(msg) | Self::BadRequest(msg) | Self::PayloadTooLarge(msg) => {
                msg.clone()
            }
        };
        let fields = match self {
            Self::Validation(err) => Some(err.fields.clone()),
            _ => None,
        };
        ErrorBody { error, fields }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added artwork", Some(&[("artwork_id", "3")]));
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
