//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Health check
//!
//! # Catalog
//! GET    /api/catalog                 - Artwork grid
//! GET    /api/catalog/{id}            - Artwork detail with all images
//! GET    /api/featured                - Featured entries
//! POST   /api/featured/{index}/cart   - Add a featured entry to the cart
//!
//! # Cart
//! GET    /api/cart                    - Cart contents and totals
//! POST   /api/cart/items              - Add an artwork
//! PATCH  /api/cart/items/{id}         - Set quantity (<= 0 removes)
//! DELETE /api/cart/items/{id}         - Remove an item
//!
//! # Checkout
//! GET    /api/checkout                - Current checkout view
//! POST   /api/checkout/open           - Open on the details step
//! POST   /api/checkout/details        - Submit the form, go to review
//! POST   /api/checkout/back           - Back to details
//! POST   /api/checkout/confirm        - Place the order
//! POST   /api/checkout/close          - Close from any step
//!
//! # Auth
//! POST   /api/auth/sign-up            - Create an account
//! POST   /api/auth/sign-in            - Email and password sign-in
//! POST   /api/auth/federated          - Federated sign-in
//! POST   /api/auth/sign-out           - Sign out
//! GET    /api/auth/me                 - Signed-in user, if any
//!
//! # Profile (requires auth)
//! GET    /api/profile                 - Resolved profile
//! PUT    /api/profile                 - Update text fields
//! POST   /api/profile/avatar/emoji    - Use a generated emoji avatar
//! POST   /api/profile/avatar          - Upload an avatar (multipart)
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod profile;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};

use crate::profile::MAX_AVATAR_BYTES;
use crate::state::AppState;

/// Multipart framing allowance on top of the avatar size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .route("/{id}", get(catalog::show))
}

/// Create the featured routes router.
pub fn featured_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::featured))
        .route("/{index}/cart", post(catalog::add_featured))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add))
        .route("/items/{id}", patch(cart::update).delete(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/open", post(checkout::open))
        .route("/details", post(checkout::details))
        .route("/back", post(checkout::back))
        .route("/confirm", post(checkout::confirm))
        .route("/close", post(checkout::close))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/federated", post(auth::federated))
        .route("/sign-out", post(auth::sign_out))
        .route("/me", get(auth::me))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).put(profile::update))
        .route("/avatar/emoji", post(profile::emoji_avatar))
        .route(
            "/avatar",
            post(profile::upload_avatar)
                .layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/catalog", catalog_routes())
        .nest("/api/featured", featured_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/checkout", checkout_routes())
        .nest("/api/auth", auth_routes())
        .nest("/api/profile", profile_routes())
}
