//! Identity: who the visitor is signed in as.
//!
//! Accounts live with an [`IdentityProvider`]. The storefront ships two:
//!
//! - [`RemoteIdentity`] - a hosted identity service over its REST API
//! - [`LocalIdentity`] - in-process accounts with argon2 password hashes,
//!   used when no provider API key is configured
//!
//! The signed-in user of each visitor is tracked by an [`AuthState`].

mod error;
mod local;
mod remote;
mod state;

pub use error::IdentityError;
pub use local::LocalIdentity;
pub use remote::RemoteIdentity;
pub use state::AuthState;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gallery_core::UserId;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A signed-in account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    /// When the account was created.
    pub creation_time: Option<DateTime<Utc>>,
}

/// Proof of identity from a federated provider's consent flow.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedCredential {
    /// Provider id, e.g. `google.com`.
    #[serde(default = "default_provider_id")]
    pub provider_id: String,
    /// OpenID Connect id token issued by the provider.
    pub id_token: String,
}

impl std::fmt::Debug for FederatedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederatedCredential")
            .field("provider_id", &self.provider_id)
            .field("id_token", &"[REDACTED]")
            .finish()
    }
}

fn default_provider_id() -> String {
    "google.com".to_owned()
}

/// An account backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether the provider has real credentials.
    ///
    /// Federated sign-in is only offered when this is `true`.
    fn is_configured(&self) -> bool;

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmailAlreadyInUse`], [`IdentityError::WeakPassword`]
    /// or [`IdentityError::InvalidEmail`] for rejected input.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, IdentityError>;

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UserNotFound`] or [`IdentityError::WrongPassword`]
    /// for bad credentials.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError>;

    /// Sign in with a federated credential.
    ///
    /// `None` means the visitor dismissed the provider's consent window.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotConfigured`] when federation is unavailable
    /// and [`IdentityError::PopupClosed`] when no credential was supplied.
    async fn sign_in_federated(
        &self,
        credential: Option<&FederatedCredential>,
    ) -> Result<AuthUser, IdentityError>;

    /// End the provider-side session, if the provider keeps one.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if the provider rejects the request.
    async fn sign_out(&self, user: &AuthUser) -> Result<(), IdentityError>;
}

/// Validate password length.
fn validate_password(password: &str) -> Result<(), IdentityError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(IdentityError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Trim a display name, treating blank as absent.
fn normalize_display_name(display_name: Option<&str>) -> Option<String> {
    display_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
}
