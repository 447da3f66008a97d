//! Checkout route handlers.
//!
//! Every handler answers with the checkout view after its transition.
//! Rejected transitions leave the checkout where it was.

use axum::{Json, extract::State};
use tracing::{info, instrument};

use gallery_core::CheckoutForm;

use crate::checkout::CheckoutView;
use crate::error::Result;
use crate::middleware::CurrentVisitor;
use crate::state::AppState;

/// Show the checkout.
///
/// Fails with `409 Conflict` while open over an emptied cart.
#[instrument(skip(visitor), fields(visitor_id = %visitor.id))]
pub async fn show(visitor: CurrentVisitor) -> Result<Json<CheckoutView>> {
    Ok(Json(visitor.handle.lock().checkout_view()?))
}

/// Open checkout on the details step.
#[instrument(skip(visitor), fields(visitor_id = %visitor.id))]
pub async fn open(visitor: CurrentVisitor) -> Result<Json<CheckoutView>> {
    let mut guard = visitor.handle.lock();
    guard.open_checkout()?;
    Ok(Json(guard.checkout_view()?))
}

/// Submit the details form.
///
/// Missing fields answer `422` with their names; the input is kept.
#[instrument(skip_all, fields(visitor_id = %visitor.id))]
pub async fn details(
    visitor: CurrentVisitor,
    Json(form): Json<CheckoutForm>,
) -> Result<Json<CheckoutView>> {
    let mut guard = visitor.handle.lock();
    guard.submit_checkout_details(form)?;
    Ok(Json(guard.checkout_view()?))
}

/// Return to the details step.
#[instrument(skip(visitor), fields(visitor_id = %visitor.id))]
pub async fn back(visitor: CurrentVisitor) -> Result<Json<CheckoutView>> {
    let mut guard = visitor.handle.lock();
    guard.checkout_back()?;
    Ok(Json(guard.checkout_view()?))
}

/// Place the order. The checkout closes itself, clearing the cart, after
/// the configured delay.
#[instrument(skip(state, visitor), fields(visitor_id = %visitor.id))]
pub async fn confirm(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
) -> Result<Json<CheckoutView>> {
    let delay = state.checkout_auto_close();
    let ticket = visitor.handle.confirm_order(delay)?;
    info!(ticket, auto_close = ?delay, "checkout auto-close armed");
    Ok(Json(visitor.handle.lock().checkout_view()?))
}

/// Close the checkout from any step.
#[instrument(skip(visitor), fields(visitor_id = %visitor.id))]
pub async fn close(visitor: CurrentVisitor) -> Result<Json<CheckoutView>> {
    let mut guard = visitor.handle.lock();
    guard.close_checkout();
    Ok(Json(guard.checkout_view()?))
}
