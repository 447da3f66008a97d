//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional. Blank values count as unset.
//!
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL; `https://` enables secure cookies
//!   (default: `http://localhost:3000`)
//! - `STOREFRONT_DATA_DIR` - Visitor storage directory (default: `data/visitors`)
//! - `STOREFRONT_VISITOR_IDLE_SECS` - Idle time before a visitor is evicted
//!   from memory (default: 1800)
//! - `STOREFRONT_CHECKOUT_AUTO_CLOSE_MS` - Delay before a completed checkout
//!   closes itself (default: 3000)
//! - `IDENTITY_API_KEY` - Identity service API key; without it accounts are
//!   kept in process and federated sign-in is disabled
//! - `IDENTITY_AUTH_DOMAIN` - Identity service auth domain
//! - `IDENTITY_PROJECT_ID` - Identity service project id
//! - `IDENTITY_BASE_URL` - Identity service REST endpoint override
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const FALLBACK_AUTH_DOMAIN: &str = "gallery-storefront.local";
const FALLBACK_PROJECT_ID: &str = "gallery-storefront";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory holding one storage document per visitor
    pub data_dir: PathBuf,
    /// How long an idle visitor stays in memory
    pub visitor_idle: Duration,
    /// Delay between order confirmation and checkout auto-close
    pub checkout_auto_close: Duration,
    /// Identity provider configuration
    pub identity: IdentityConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Identity provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct IdentityConfig {
    /// API key; `None` selects the in-process provider.
    pub api_key: Option<SecretString>,
    /// Auth domain used for federated sign-in redirects
    pub auth_domain: String,
    /// Project id
    pub project_id: String,
    /// REST endpoint override (e.g. a local emulator)
    pub base_url: Option<String>,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field(
                "api_key",
                &self.api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("auth_domain", &self.auth_domain)
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl IdentityConfig {
    /// Fallback used when no provider is configured.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            api_key: None,
            auth_domain: FALLBACK_AUTH_DOMAIN.to_owned(),
            project_id: FALLBACK_PROJECT_ID.to_owned(),
            base_url: None,
        }
    }

    /// Returns `true` when a real provider API key is present.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn from_env() -> Self {
        Self {
            api_key: get_optional_env("IDENTITY_API_KEY").map(SecretString::from),
            auth_domain: get_env_or_default("IDENTITY_AUTH_DOMAIN", FALLBACK_AUTH_DOMAIN),
            project_id: get_env_or_default("IDENTITY_PROJECT_ID", FALLBACK_PROJECT_ID),
            base_url: get_optional_env("IDENTITY_BASE_URL"),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;
        let data_dir = PathBuf::from(get_env_or_default("STOREFRONT_DATA_DIR", "data/visitors"));
        let visitor_idle = Duration::from_secs(parse_env("STOREFRONT_VISITOR_IDLE_SECS", "1800")?);
        let checkout_auto_close =
            Duration::from_millis(parse_env("STOREFRONT_CHECKOUT_AUTO_CLOSE_MS", "3000")?);

        Ok(Self {
            host,
            port,
            base_url,
            data_dir,
            visitor_idle,
            checkout_auto_close,
            identity: IdentityConfig::from_env(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns `true` if the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl Default for StorefrontConfig {
    /// Development defaults with the fallback identity provider.
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            data_dir: PathBuf::from("data/visitors"),
            visitor_idle: Duration::from_secs(1800),
            checkout_auto_close: crate::checkout::DEFAULT_AUTO_CLOSE_DELAY,
            identity: IdentityConfig::fallback(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        let port: u16 = parse_value("STOREFRONT_PORT", "8080").unwrap();
        assert_eq!(port, 8080);

        let err = parse_value::<u16>("STOREFRONT_PORT", "not-a-port").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "STOREFRONT_PORT"));

        let rate: f32 = parse_value("SENTRY_SAMPLE_RATE", "0.25").unwrap();
        assert!((rate - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig::default();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_default_uses_fallback_identity() {
        let config = StorefrontConfig::default();
        assert!(!config.identity.is_configured());
        assert_eq!(config.identity.project_id, FALLBACK_PROJECT_ID);
        assert_eq!(config.checkout_auto_close, Duration::from_millis(3000));
        assert!(!config.is_secure());
    }

    #[test]
    fn test_is_secure() {
        let config = StorefrontConfig {
            base_url: "https://gallery.example.com".to_string(),
            ..StorefrontConfig::default()
        };
        assert!(config.is_secure());
    }

    #[test]
    fn test_identity_config_debug_redacts_key() {
        let config = IdentityConfig {
            api_key: Some(SecretString::from("super_secret_api_key")),
            ..IdentityConfig::fallback()
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains(FALLBACK_AUTH_DOMAIN));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_api_key"));
    }
}
