//! Cart route handlers.
//!
//! Quantities arrive as signed integers; anything at or below zero removes
//! the line, see [`apply_quantity`].

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use gallery_core::{ArtworkId, CartLineItem, ItemKey, Money, NewLineItem};

use crate::cart::{CartEngine, CartError};
use crate::error::{AppError, Result};
use crate::middleware::CurrentVisitor;
use crate::state::AppState;
use crate::storage::KeyValueStore;

/// Cart line with its formatted line total.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    #[serde(flatten)]
    pub item: CartLineItem,
    pub line_total: String,
}

/// Cart contents and totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: Decimal,
    /// Total formatted as e.g. `90 000 ₴`.
    pub total_display: String,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub fn from_engine<S: KeyValueStore>(cart: &CartEngine<S>) -> Self {
        let total = cart.total();
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView {
                    line_total: Money::from(item.line_total()).display(),
                    item: item.clone(),
                })
                .collect(),
            total,
            total_display: Money::new(total).display(),
            item_count: cart.item_count(),
        }
    }
}

/// Result of adding to the cart. The client opens the cart panel when
/// `open_cart` is set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartResponse {
    pub item: CartLineItem,
    pub cart: CartView,
    pub open_cart: bool,
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub artwork_id: i32,
    /// Defaults to one.
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Set a line's quantity, removing it when `quantity <= 0`.
///
/// Quantities above `u32::MAX` are clamped.
///
/// # Errors
///
/// Returns [`CartError::NotFound`] if no line has `id`.
pub fn apply_quantity<S: KeyValueStore>(
    cart: &mut CartEngine<S>,
    id: &ItemKey,
    quantity: i64,
) -> std::result::Result<(), CartError> {
    if quantity <= 0 {
        return if cart.remove_item(id) {
            Ok(())
        } else {
            Err(CartError::NotFound(id.clone()))
        };
    }
    cart.update_quantity(id, u32::try_from(quantity).unwrap_or(u32::MAX))
}

/// Show the cart.
#[instrument(skip(visitor), fields(visitor_id = %visitor.id))]
pub async fn show(visitor: CurrentVisitor) -> Json<CartView> {
    Json(CartView::from_engine(visitor.handle.lock().cart()))
}

/// Add a catalog artwork to the cart.
#[instrument(skip(state, visitor), fields(visitor_id = %visitor.id))]
pub async fn add(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<AddToCartResponse>> {
    let artwork = state
        .catalog()
        .artwork(ArtworkId::new(request.artwork_id))
        .ok_or_else(|| AppError::NotFound(format!("artwork {}", request.artwork_id)))?;
    let line = NewLineItem::from_artwork(artwork).with_quantity(request.quantity.unwrap_or(1));

    let mut guard = visitor.handle.lock();
    let item = guard.cart_mut().add_item(line);
    info!(item_id = %item.id, quantity = item.quantity, "artwork added to cart");

    Ok(Json(AddToCartResponse {
        item,
        cart: CartView::from_engine(guard.cart()),
        open_cart: true,
    }))
}

/// Set the quantity of a cart line.
#[instrument(skip(visitor), fields(visitor_id = %visitor.id))]
pub async fn update(
    visitor: CurrentVisitor,
    Path(id): Path<String>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    let key = ItemKey::from_segment(&id);
    let mut guard = visitor.handle.lock();
    apply_quantity(guard.cart_mut(), &key, request.quantity)?;
    Ok(Json(CartView::from_engine(guard.cart())))
}

/// Remove a cart line.
#[instrument(skip(visitor), fields(visitor_id = %visitor.id))]
pub async fn remove(visitor: CurrentVisitor, Path(id): Path<String>) -> Result<Json<CartView>> {
    let key = ItemKey::from_segment(&id);
    let mut guard = visitor.handle.lock();
    if !guard.cart_mut().remove_item(&key) {
        return Err(CartError::NotFound(key).into());
    }
    Ok(Json(CartView::from_engine(guard.cart())))
}
