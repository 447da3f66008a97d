//! Integration tests for the gallery storefront.
//!
//! The full router runs in process: requests go through
//! `tower::ServiceExt::oneshot` with the session cookie carried between
//! them, visitors use in-memory storage unless a test picks a data directory,
//! and accounts use the in-process identity provider.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gallery-integration-tests
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use gallery_storefront::catalog::Catalog;
use gallery_storefront::config::StorefrontConfig;
use gallery_storefront::services::auth::LocalIdentity;
use gallery_storefront::state::AppState;
use gallery_storefront::storage::StorageBackend;

/// Multipart boundary used by [`TestClient::upload`].
const BOUNDARY: &str = "gallery-test-boundary";

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    /// JSON body, or the raw text as a JSON string when it is not JSON.
    pub body: Value,
}

/// One browser talking to its own storefront instance.
#[derive(Clone)]
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    /// Fresh storefront with the default auto-close delay.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StorefrontConfig::default())
    }

    /// Fresh storefront with a custom auto-close delay.
    #[must_use]
    pub fn with_auto_close(delay: Duration) -> Self {
        Self::with_config(StorefrontConfig {
            checkout_auto_close: delay,
            ..StorefrontConfig::default()
        })
    }

    /// Fresh storefront whose visitors and sessions live in `backend`.
    ///
    /// Two clients built over the same directory behave like one server
    /// before and after a restart.
    #[must_use]
    pub fn with_backend(backend: StorageBackend) -> Self {
        Self::with_parts(StorefrontConfig::default(), backend)
    }

    fn with_config(config: StorefrontConfig) -> Self {
        Self::with_parts(config, StorageBackend::Memory)
    }

    fn with_parts(config: StorefrontConfig, backend: StorageBackend) -> Self {
        let state = AppState::with_parts(
            config,
            Catalog::seeded(),
            Arc::new(LocalIdentity::new()),
            backend,
        );
        Self {
            app: gallery_storefront::app(state),
            cookie: None,
        }
    }

    /// Another browser on the same storefront: same accounts, no cookie.
    #[must_use]
    pub fn new_browser(&self) -> Self {
        Self {
            app: self.app.clone(),
            cookie: None,
        }
    }

    /// This browser, cookie included, talking to `storefront` instead.
    #[must_use]
    pub fn revisit(&self, storefront: &Self) -> Self {
        Self {
            app: storefront.app.clone(),
            cookie: self.cookie.clone(),
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&mut self, path: &str, body: Value) -> TestResponse {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&mut self, path: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&mut self, path: &str, body: Value) -> TestResponse {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&mut self, path: &str) -> TestResponse {
        self.send(Method::DELETE, path, None).await
    }

    /// Send a JSON request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    pub async fn send(&mut self, method: Method, path: &str, body: Option<Value>) -> TestResponse {
        let mut request = Request::builder().method(method).uri(path);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.dispatch(request, body).await
    }

    /// Upload one file as a multipart field.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    pub async fn upload(
        &mut self,
        path: &str,
        field: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> TestResponse {
        let mut payload = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        payload.extend_from_slice(bytes);
        payload.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        self.dispatch(request, Body::from(payload)).await
    }

    #[allow(clippy::unwrap_used)]
    async fn dispatch(
        &mut self,
        mut request: axum::http::request::Builder,
        body: Body,
    ) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_owned());
        }

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse { status, body }
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}
