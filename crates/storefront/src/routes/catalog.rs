//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::{info, instrument};

use gallery_core::{Artwork, ArtworkId, FeaturedArtwork};

use crate::error::{AppError, Result};
use crate::middleware::CurrentVisitor;
use crate::routes::cart::{AddToCartResponse, CartView};
use crate::state::AppState;

/// Artwork as shown in the gallery modal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkDetail {
    #[serde(flatten)]
    pub artwork: Artwork,
    /// Primary image followed by the additional ones.
    pub images: Vec<String>,
    pub price_value: u64,
}

impl From<&Artwork> for ArtworkDetail {
    fn from(artwork: &Artwork) -> Self {
        Self {
            images: artwork.images().map(str::to_owned).collect(),
            price_value: artwork.price_value(),
            artwork: artwork.clone(),
        }
    }
}

/// List all artworks.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Vec<Artwork>> {
    Json(state.catalog().artworks().to_vec())
}

/// Show one artwork.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<ArtworkDetail>> {
    state
        .catalog()
        .artwork(ArtworkId::new(id))
        .map(|artwork| Json(ArtworkDetail::from(artwork)))
        .ok_or_else(|| AppError::NotFound(format!("artwork {id}")))
}

/// List featured entries.
#[instrument(skip(state))]
pub async fn featured(State(state): State<AppState>) -> Json<Vec<FeaturedArtwork>> {
    Json(state.catalog().featured().to_vec())
}

/// Add the featured entry at `index` to the cart.
#[instrument(skip(state, visitor), fields(visitor_id = %visitor.id))]
pub async fn add_featured(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
    Path(index): Path<usize>,
) -> Result<Json<AddToCartResponse>> {
    let request = state
        .catalog()
        .featured_line_item(index)
        .ok_or_else(|| AppError::NotFound(format!("featured entry {index}")))?;

    let mut guard = visitor.handle.lock();
    let item = guard.cart_mut().add_item(request);
    info!(item_id = %item.id, quantity = item.quantity, "featured artwork added to cart");

    Ok(Json(AddToCartResponse {
        item,
        cart: CartView::from_engine(guard.cart()),
        open_cart: true,
    }))
}
