//! Hosted identity service client.
//!
//! Talks to an Identity Toolkit style REST API (`accounts:signUp`,
//! `accounts:signInWithPassword`, `accounts:update`, `accounts:lookup`,
//! `accounts:signInWithIdp`). Every call is authenticated with the project's
//! API key as the `key` query parameter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use gallery_core::UserId;

use super::{
    AuthUser, FederatedCredential, IdentityError, IdentityProvider, normalize_display_name,
    validate_password,
};
use crate::config::IdentityConfig;

/// Public endpoint of the hosted identity service.
pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Client for the hosted identity service.
#[derive(Clone)]
pub struct RemoteIdentity {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    request_uri: String,
}

impl std::fmt::Debug for RemoteIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteIdentity")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("request_uri", &self.request_uri)
            .finish()
    }
}

/// Error envelope returned by the service.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Fields shared by the sign-up, sign-in and federated responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    /// Milliseconds since the epoch, as a decimal string.
    created_at: Option<String>,
}

impl From<AccountInfo> for AuthUser {
    fn from(info: AccountInfo) -> Self {
        let creation_time = info
            .created_at
            .as_deref()
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis);

        Self {
            uid: UserId::new(info.local_id),
            email: info.email,
            display_name: info.display_name,
            photo_url: info.photo_url,
            creation_time,
        }
    }
}

impl RemoteIdentity {
    /// Create a client from configuration.
    ///
    /// `request_uri` is the storefront's public URL, reported to the service
    /// as the origin of federated sign-ins.
    #[must_use]
    pub fn new(config: &IdentityConfig, api_key: SecretString, request_uri: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            api_key,
            request_uri: request_uri.to_owned(),
        }
    }

    /// Full URL of an `accounts:*` method, with the API key attached.
    fn endpoint(&self, method: &str) -> Result<Url, IdentityError> {
        let mut url = Url::parse(&format!(
            "{}/accounts:{method}",
            self.base_url.trim_end_matches('/')
        ))
        .map_err(|e| IdentityError::Parse(format!("invalid identity base URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        Ok(url)
    }

    /// POST a JSON body to an `accounts:*` method.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, IdentityError> {
        let response = self
            .client
            .post(self.endpoint(method)?)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(method, status = status.as_u16(), "identity call rejected");
            return Err(map_error_response(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| IdentityError::Parse(e.to_string()))
    }

    /// Fetch the account behind an id token.
    async fn lookup(&self, id_token: &str) -> Result<AuthUser, IdentityError> {
        let response: LookupResponse = self
            .call("lookup", &serde_json::json!({ "idToken": id_token }))
            .await?;
        response
            .users
            .into_iter()
            .next()
            .map(AuthUser::from)
            .ok_or(IdentityError::UserNotFound)
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentity {
    fn is_configured(&self) -> bool {
        true
    }

    #[instrument(skip(self, password))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, IdentityError> {
        validate_password(password)?;

        let token: TokenResponse = self
            .call(
                "signUp",
                &serde_json::json!({
                    "email": email.trim(),
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        if let Some(name) = normalize_display_name(display_name) {
            let _: serde_json::Value = self
                .call(
                    "update",
                    &serde_json::json!({
                        "idToken": token.id_token,
                        "displayName": name,
                        "returnSecureToken": false,
                    }),
                )
                .await?;
        }

        self.lookup(&token.id_token).await
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError> {
        let token: TokenResponse = self
            .call(
                "signInWithPassword",
                &serde_json::json!({
                    "email": email.trim(),
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        self.lookup(&token.id_token).await
    }

    #[instrument(skip(self, credential))]
    async fn sign_in_federated(
        &self,
        credential: Option<&FederatedCredential>,
    ) -> Result<AuthUser, IdentityError> {
        let credential = credential.ok_or(IdentityError::PopupClosed)?;

        let post_body = format!(
            "id_token={}&providerId={}",
            urlencoding::encode(&credential.id_token),
            urlencoding::encode(&credential.provider_id)
        );
        let token: TokenResponse = self
            .call(
                "signInWithIdp",
                &serde_json::json!({
                    "postBody": post_body,
                    "requestUri": self.request_uri,
                    "returnSecureToken": true,
                    "returnIdpCredential": true,
                }),
            )
            .await?;
        self.lookup(&token.id_token).await
    }

    async fn sign_out(&self, _user: &AuthUser) -> Result<(), IdentityError> {
        // Tokens are held by the visitor session only; dropping it is enough.
        Ok(())
    }
}

/// Map an error response body to an [`IdentityError`].
///
/// The service reports failures as `{"error": {"message": "CODE"}}`, where
/// the message may carry detail after `" : "`.
fn map_error_response(status: u16, body: &str) -> IdentityError {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return IdentityError::Provider {
            status,
            message: body.chars().take(200).collect(),
        };
    };

    let message = envelope.error.message;
    let (code, detail) = message
        .split_once(" : ")
        .unwrap_or((message.as_str(), ""));

    match code {
        "EMAIL_EXISTS" => IdentityError::EmailAlreadyInUse,
        "WEAK_PASSWORD" => IdentityError::WeakPassword(detail.to_owned()),
        "INVALID_EMAIL" | "MISSING_EMAIL" => IdentityError::InvalidEmail,
        "EMAIL_NOT_FOUND" | "USER_DISABLED" => IdentityError::UserNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "MISSING_PASSWORD" => {
            IdentityError::WrongPassword
        }
        "CONFIGURATION_NOT_FOUND" | "OPERATION_NOT_ALLOWED" | "INVALID_IDP_RESPONSE" => {
            IdentityError::NotConfigured
        }
        _ => IdentityError::Provider {
            status,
            message: message.clone(),
        },
    }
}
