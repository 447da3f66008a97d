//! Identity provider error types.

use thiserror::Error;

/// Errors that can occur during sign-up, sign-in, or sign-out.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// An account with this email already exists.
    #[error("email already in use")]
    EmailAlreadyInUse,

    /// Password rejected by the provider's policy.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Email is not a valid address.
    #[error("invalid email")]
    InvalidEmail,

    /// No account with this email.
    #[error("user not found")]
    UserNotFound,

    /// Account exists but the password does not match.
    #[error("wrong password")]
    WrongPassword,

    /// The federated consent window was dismissed.
    #[error("sign-in popup closed by user")]
    PopupClosed,

    /// The provider has no usable configuration.
    #[error("identity provider is not configured")]
    NotConfigured,

    /// HTTP request to the provider failed.
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with an error we do not map.
    #[error("identity provider error: {status} - {message}")]
    Provider { status: u16, message: String },

    /// The provider's response could not be parsed.
    #[error("identity provider response error: {0}")]
    Parse(String),

    /// Password hashing failed.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<gallery_core::EmailError> for IdentityError {
    fn from(_: gallery_core::EmailError) -> Self {
        Self::InvalidEmail
    }
}

impl IdentityError {
    /// Message safe to show the visitor.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmailAlreadyInUse => "Email is already in use".to_owned(),
            Self::WeakPassword(_) => "Password is too weak (at least 6 characters)".to_owned(),
            Self::InvalidEmail => "Invalid email format".to_owned(),
            Self::UserNotFound => "User not found".to_owned(),
            Self::WrongPassword => "Wrong password".to_owned(),
            Self::PopupClosed => "The sign-in window was closed".to_owned(),
            Self::NotConfigured => "Sign-in with this provider is not configured".to_owned(),
            Self::Transport(_) | Self::Provider { .. } | Self::Parse(_) | Self::PasswordHash => {
                "Authentication error".to_owned()
            }
        }
    }

    /// Returns `true` for failures on our side or the provider's, as opposed
    /// to a problem with what the visitor entered.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Provider { .. } | Self::Parse(_) | Self::PasswordHash
        )
    }
}
