//! Core types for the gallery storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod artwork;
pub mod cart;
pub mod checkout;
pub mod email;
pub mod id;
pub mod price;
pub mod profile;

pub use artwork::{Artwork, FeaturedArtwork};
pub use cart::{CartLineItem, NewLineItem};
pub use checkout::{CheckoutForm, CheckoutStep, OrderSummary, PaymentMethod};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Money, normalize_price};
pub use profile::{ProfileField, UserProfile};
