//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, file or in-memory store)
//!
//! Handlers reach their visitor through the [`CurrentVisitor`] extractor and
//! the signed-in user through [`RequireUser`].

pub mod auth;
pub mod request_id;
pub mod session;
pub mod visitor;

pub use auth::RequireUser;
pub use request_id::request_id_middleware;
pub use session::{VisitorSessionStore, create_session_layer};
pub use visitor::CurrentVisitor;
