//! Per-visitor sign-in state.

use tokio::sync::watch;

use super::AuthUser;

/// The signed-in user of one visitor, observable for changes.
#[derive(Debug)]
pub struct AuthState {
    tx: watch::Sender<Option<AuthUser>>,
}

impl AuthState {
    /// Start signed out.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// The current user, if signed in.
    #[must_use]
    pub fn current(&self) -> Option<AuthUser> {
        self.tx.borrow().clone()
    }

    /// Returns `true` if a user is signed in.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Record a sign-in.
    pub fn sign_in(&self, user: AuthUser) {
        self.tx.send_replace(Some(user));
    }

    /// Record a sign-out. Returns the user that was signed in.
    pub fn sign_out(&self) -> Option<AuthUser> {
        self.tx.send_replace(None)
    }

    /// Subscribe to sign-in and sign-out events.
    ///
    /// The receiver sees the current value immediately and every change
    /// after it.
    #[must_use]
    pub fn on_auth_state_change(&self) -> watch::Receiver<Option<AuthUser>> {
        self.tx.subscribe()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}
