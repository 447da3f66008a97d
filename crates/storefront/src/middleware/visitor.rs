//! Visitor extractor.
//!
//! Every browser gets a visitor id on its first request. The id is kept in
//! the session and resolves to the visitor's state in the registry.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::{Span, debug};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::visitor::VisitorHandle;

/// Session key holding the visitor id.
pub const VISITOR_ID_KEY: &str = "visitor_id";

/// The visitor making the request.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentVisitor { handle, .. }: CurrentVisitor) -> String {
///     handle.lock().cart().item_count().to_string()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentVisitor {
    pub id: Uuid,
    pub handle: VisitorHandle,
}

impl FromRequestParts<AppState> for CurrentVisitor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer not installed".to_string()))?;

        let id = visitor_id(&session).await?;
        Span::current().record("visitor_id", tracing::field::display(id));

        let handle = state.visitors().get_or_restore(id).await?;
        Ok(Self { id, handle })
    }
}

/// Read the visitor id from the session, assigning one if absent.
async fn visitor_id(session: &Session) -> Result<Uuid, AppError> {
    let existing = session
        .get::<Uuid>(VISITOR_ID_KEY)
        .await
        .map_err(|e| AppError::Internal(format!("session read failed: {e}")))?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    session
        .insert(VISITOR_ID_KEY, id)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;
    debug!(visitor_id = %id, "new visitor");
    Ok(id)
}
