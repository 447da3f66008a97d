//! Services backed by external systems.
//!
//! - `auth` - Sign-up, sign-in and the signed-in user, against a hosted
//!   identity provider or the in-process fallback

pub mod auth;
