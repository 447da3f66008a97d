//! In-process identity provider.
//!
//! Accounts are held in memory and lost on restart. Passwords are stored as
//! Argon2id hashes. Federated sign-in is never available.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use gallery_core::{Email, UserId};

use super::{
    AuthUser, FederatedCredential, IdentityError, IdentityProvider, normalize_display_name,
    validate_password,
};

struct LocalAccount {
    uid: UserId,
    password_hash: String,
    display_name: Option<String>,
    creation_time: DateTime<Utc>,
}

/// Memory-backed accounts keyed by normalized email.
#[derive(Default)]
pub struct LocalIdentity {
    accounts: RwLock<HashMap<Email, LocalAccount>>,
}

impl LocalIdentity {
    /// Create an empty account registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no account has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for LocalIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalIdentity")
            .field("accounts", &self.len())
            .finish()
    }
}

fn to_user(email: &Email, account: &LocalAccount) -> AuthUser {
    AuthUser {
        uid: account.uid.clone(),
        email: Some(email.as_str().to_owned()),
        display_name: account.display_name.clone(),
        photo_url: None,
        creation_time: Some(account.creation_time),
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    fn is_configured(&self) -> bool {
        false
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, IdentityError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if accounts.contains_key(&email) {
            return Err(IdentityError::EmailAlreadyInUse);
        }

        let account = LocalAccount {
            uid: UserId::new(Uuid::new_v4().simple().to_string()),
            password_hash,
            display_name: normalize_display_name(display_name),
            creation_time: Utc::now(),
        };
        let user = to_user(&email, &account);
        accounts.insert(email, account);
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError> {
        let email = Email::parse(email)?;

        let accounts = self
            .accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let account = accounts.get(&email).ok_or(IdentityError::UserNotFound)?;
        verify_password(password, &account.password_hash)?;
        Ok(to_user(&email, account))
    }

    async fn sign_in_federated(
        &self,
        _credential: Option<&FederatedCredential>,
    ) -> Result<AuthUser, IdentityError> {
        Err(IdentityError::NotConfigured)
    }

    async fn sign_out(&self, _user: &AuthUser) -> Result<(), IdentityError> {
        Ok(())
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| IdentityError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), IdentityError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| IdentityError::PasswordHash)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| IdentityError::WrongPassword)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let identity = LocalIdentity::new();
        let created = identity
            .sign_up("Collector@Example.com", "secret1", Some("  Anna "))
            .await
            .unwrap();
        assert_eq!(created.email.as_deref(), Some("collector@example.com"));
        assert_eq!(created.display_name.as_deref(), Some("Anna"));
        assert!(created.creation_time.is_some());

        let signed_in = identity
            .sign_in("collector@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(signed_in.uid, created.uid);
        assert_eq!(identity.len(), 1);
    }

    #[tokio::test]
    async fn test_sign_up_errors() {
        let identity = LocalIdentity::new();
        identity.sign_up("a@example.com", "secret1", None).await.unwrap();

        assert!(matches!(
            identity.sign_up("a@example.com", "secret2", None).await,
            Err(IdentityError::EmailAlreadyInUse)
        ));
        assert!(matches!(
            identity.sign_up("b@example.com", "12345", None).await,
            Err(IdentityError::WeakPassword(_))
        ));
        assert!(matches!(
            identity.sign_up("not-an-email", "secret1", None).await,
            Err(IdentityError::InvalidEmail)
        ));
    }

    #[tokio::test]
    async fn test_sign_in_errors() {
        let identity = LocalIdentity::new();
        identity.sign_up("a@example.com", "secret1", None).await.unwrap();

        assert!(matches!(
            identity.sign_in("b@example.com", "secret1").await,
            Err(IdentityError::UserNotFound)
        ));
        assert!(matches!(
            identity.sign_in("a@example.com", "wrong-password").await,
            Err(IdentityError::WrongPassword)
        ));
    }

    #[tokio::test]
    async fn test_federated_sign_in_not_configured() {
        let identity = LocalIdentity::new();
        assert!(!identity.is_configured());
        assert!(matches!(
            identity.sign_in_federated(None).await,
            Err(IdentityError::NotConfigured)
        ));
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret1", &hash).is_ok());
        assert!(matches!(
            verify_password("secret2", &hash),
            Err(IdentityError::WrongPassword)
        ));
    }
}
