//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::middleware::VisitorSessionStore;
use crate::services::auth::{IdentityProvider, LocalIdentity, RemoteIdentity};
use crate::storage::StorageBackend;
use crate::visitor::VisitorRegistry;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    identity: Arc<dyn IdentityProvider>,
    visitors: VisitorRegistry,
    sessions: VisitorSessionStore,
    backend: StorageBackend,
}

impl AppState {
    /// Create the application state from configuration.
    ///
    /// Visitors and sessions are stored as files under the configured data
    /// directory. A
    /// configured identity API key selects the hosted provider; otherwise
    /// accounts are kept in process.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let identity: Arc<dyn IdentityProvider> = match &config.identity.api_key {
            Some(api_key) => {
                info!(project_id = %config.identity.project_id, "using hosted identity provider");
                Arc::new(RemoteIdentity::new(
                    &config.identity,
                    api_key.clone(),
                    &config.base_url,
                ))
            }
            None => {
                warn!("IDENTITY_API_KEY not set, accounts are kept in memory");
                Arc::new(LocalIdentity::new())
            }
        };
        let backend = StorageBackend::Files(config.data_dir.clone());

        Self::with_parts(config, Catalog::seeded(), identity, backend)
    }

    /// Assemble the state from explicit parts.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        catalog: Catalog,
        identity: Arc<dyn IdentityProvider>,
        backend: StorageBackend,
    ) -> Self {
        let visitors = VisitorRegistry::new(backend.clone(), config.visitor_idle);
        let sessions = VisitorSessionStore::for_backend(&backend);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                identity,
                visitors,
                sessions,
                backend,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// The identity provider used for sign-up and sign-in.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    #[must_use]
    pub fn visitors(&self) -> &VisitorRegistry {
        &self.inner.visitors
    }

    /// Session records mapping cookies to visitor ids.
    #[must_use]
    pub fn sessions(&self) -> &VisitorSessionStore {
        &self.inner.sessions
    }

    /// Drop expired sessions together with the storage of their visitors.
    ///
    /// Returns how many visitors were removed. Failures are logged and the
    /// sweep carries on.
    pub async fn sweep_expired_sessions(&self) -> usize {
        let expired = match self.inner.sessions.delete_expired().await {
            Ok(expired) => expired,
            Err(e) => {
                warn!(error = %e, "session sweep failed");
                return 0;
            }
        };

        let mut purged = 0;
        for visitor_id in expired {
            match self.inner.backend.purge(&visitor_id.simple().to_string()) {
                Ok(()) => purged += 1,
                Err(e) => warn!(%visitor_id, error = %e, "failed to purge visitor storage"),
            }
        }
        if purged > 0 {
            info!(purged, "expired visitors purged");
        }
        purged
    }

    /// Delay before a completed checkout closes itself.
    #[must_use]
    pub fn checkout_auto_close(&self) -> Duration {
        self.inner.config.checkout_auto_close
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("identity_configured", &self.inner.identity.is_configured())
            .field("visitors", &self.inner.visitors)
            .field("sessions", &self.inner.sessions)
            .finish_non_exhaustive()
    }
}
