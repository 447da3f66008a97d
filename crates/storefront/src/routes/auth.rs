//! Authentication route handlers.
//!
//! Sign-in state is per visitor: signing in here signs in this browser only.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::CurrentVisitor;
use crate::profile::ResolvedProfile;
use crate::services::auth::{AuthUser, FederatedCredential};
use crate::state::AppState;
use crate::visitor::VisitorHandle;

// =============================================================================
// Request Types
// =============================================================================

/// Sign-up request body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    /// Checked against `password` when present.
    #[serde(default)]
    pub confirm_password: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Sign-in request body.
#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Federated sign-in request body. A missing credential means the consent
/// window was closed.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FederatedRequest {
    pub credential: Option<FederatedCredential>,
}

// =============================================================================
// Response Types
// =============================================================================

/// Who is signed in on this visitor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user: Option<ResolvedProfile>,
    /// Whether federated sign-in is offered.
    pub federated_sign_in: bool,
}

impl SessionView {
    fn new(state: &AppState, handle: &VisitorHandle) -> Self {
        let visitor = handle.lock();
        Self {
            user: visitor
                .auth()
                .current()
                .map(|user| visitor.profiles().resolve(&user)),
            federated_sign_in: state.identity().is_configured(),
        }
    }
}

/// Record a successful sign-in on the visitor.
fn complete_sign_in(
    state: &AppState,
    handle: &VisitorHandle,
    user: AuthUser,
    method: &str,
) -> SessionView {
    set_sentry_user(&user.uid, user.email.as_deref());
    add_breadcrumb("auth", "signed in", Some(&[("method", method)]));
    info!(user_id = %user.uid, method, "user signed in");

    handle.lock().auth().sign_in(user);
    SessionView::new(state, handle)
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account and sign it in.
#[instrument(skip_all, fields(visitor_id = %visitor.id))]
pub async fn sign_up(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
    Json(request): Json<SignUpRequest>,
) -> Result<Json<SessionView>> {
    if request
        .confirm_password
        .as_ref()
        .is_some_and(|confirm| *confirm != request.password)
    {
        return Err(AppError::BadRequest("Passwords do not match".to_string()));
    }

    let user = state
        .identity()
        .sign_up(
            &request.email,
            &request.password,
            request.display_name.as_deref(),
        )
        .await?;
    Ok(Json(complete_sign_in(&state, &visitor.handle, user, "sign_up")))
}

/// Sign in with email and password.
#[instrument(skip_all, fields(visitor_id = %visitor.id))]
pub async fn sign_in(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SessionView>> {
    let user = state
        .identity()
        .sign_in(&request.email, &request.password)
        .await?;
    Ok(Json(complete_sign_in(&state, &visitor.handle, user, "password")))
}

/// Sign in with a federated credential.
#[instrument(skip_all, fields(visitor_id = %visitor.id))]
pub async fn federated(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
    Json(request): Json<FederatedRequest>,
) -> Result<Json<SessionView>> {
    let user = state
        .identity()
        .sign_in_federated(request.credential.as_ref())
        .await?;
    Ok(Json(complete_sign_in(&state, &visitor.handle, user, "federated")))
}

/// Sign out. Signing out while signed out is a no-op.
#[instrument(skip_all, fields(visitor_id = %visitor.id))]
pub async fn sign_out(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
) -> Json<SessionView> {
    let signed_out = visitor.handle.lock().auth().sign_out();
    if let Some(user) = signed_out {
        if let Err(e) = state.identity().sign_out(&user).await {
            warn!(user_id = %user.uid, error = %e, "provider sign-out failed");
        }
        clear_sentry_user();
        info!(user_id = %user.uid, "user signed out");
    }
    Json(SessionView::new(&state, &visitor.handle))
}

/// Show the signed-in user, if any.
#[instrument(skip_all, fields(visitor_id = %visitor.id))]
pub async fn me(State(state): State<AppState>, visitor: CurrentVisitor) -> Json<SessionView> {
    Json(SessionView::new(&state, &visitor.handle))
}
