//! Gallery Core - Shared domain types.
//!
//! This crate provides the types shared by the storefront and its tests:
//! artworks, cart line items, checkout forms and pricing, and profile fields.
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! storage, no HTTP clients. Pricing rules live here so that every caller
//! derives money the same way.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, emails, cart and checkout types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
