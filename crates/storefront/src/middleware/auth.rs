//! Authentication extractor.
//!
//! Sign-in state belongs to the visitor, so requiring a user means resolving
//! the visitor first.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::middleware::visitor::CurrentVisitor;
use crate::services::auth::AuthUser;
use crate::state::AppState;
use crate::visitor::VisitorHandle;

/// Extractor that requires a signed-in user.
///
/// Rejects with `401 Unauthorized` when the visitor is signed out.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser { user, .. }: RequireUser) -> String {
///     format!("Hello, {}!", user.uid)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireUser {
    pub visitor: VisitorHandle,
    pub user: AuthUser,
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentVisitor { handle, .. } = CurrentVisitor::from_request_parts(parts, state).await?;
        let user = handle
            .lock()
            .auth()
            .current()
            .ok_or_else(|| AppError::Unauthorized("Sign in to continue".to_string()))?;

        Ok(Self {
            visitor: handle,
            user,
        })
    }
}
