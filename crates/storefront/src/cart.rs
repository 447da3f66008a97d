//! Cart engine.
//!
//! Holds one visitor's cart and persists the full line-item sequence as JSON
//! under [`CART_KEY`] after every mutation. Storage failures never reach the
//! caller: the in-memory cart stays authoritative and the failure is logged.

use std::collections::HashMap;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use gallery_core::{CartLineItem, ItemKey, NewLineItem};

use crate::storage::{CART_KEY, KeyValueStore};

/// Errors from cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// No line item has this id.
    #[error("cart item not found: {0}")]
    NotFound(ItemKey),

    /// Quantities must be at least one; remove the item instead.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// A cart bound to its durable storage.
#[derive(Debug)]
pub struct CartEngine<S> {
    items: Vec<CartLineItem>,
    storage: S,
}

impl<S: KeyValueStore> CartEngine<S> {
    /// Load the cart persisted in `storage`.
    ///
    /// Absent or unreadable data yields an empty cart. Entries with a zero
    /// quantity are dropped and repeated ids are merged into the first
    /// occurrence, keeping its display fields.
    pub fn restore(storage: S) -> Self {
        let stored = match storage.get_item(CART_KEY) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "failed to read stored cart");
                None
            }
        };

        let items = stored
            .and_then(|json| match serde_json::from_str::<Vec<CartLineItem>>(&json) {
                Ok(items) => Some(items),
                Err(e) => {
                    warn!(error = %e, "discarding malformed stored cart");
                    None
                }
            })
            .map(normalize)
            .unwrap_or_default();

        Self { items, storage }
    }

    /// Line items in first-added order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Owned copy of the line items.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CartLineItem> {
        self.items.clone()
    }

    /// Returns `true` if the cart holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `quantity × price_value` over all line items.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| Decimal::from(item.line_total()))
            .sum()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Add an item, merging with an existing line item of the same id.
    ///
    /// On merge the quantity accumulates and the unit and display price are
    /// refreshed from the request. Returns the resulting line item.
    pub fn add_item(&mut self, item: NewLineItem) -> CartLineItem {
        let line = if let Some(existing) = self.items.iter_mut().find(|line| line.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(item.effective_quantity());
            existing.price_value = item.resolved_price();
            existing.price = item.price;
            existing.clone()
        } else {
            let line = item.into_line_item();
            self.items.push(line.clone());
            line
        };
        self.persist();
        line
    }

    /// Set the quantity of an existing line item.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for zero and
    /// [`CartError::NotFound`] when no line item has this id.
    pub fn update_quantity(&mut self, id: &ItemKey, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == *id)
            .ok_or_else(|| CartError::NotFound(id.clone()))?;
        item.quantity = quantity;
        self.persist();
        Ok(())
    }

    /// Remove a line item. Returns whether anything was removed.
    pub fn remove_item(&mut self, id: &ItemKey) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != *id);
        let removed = self.items.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.items)
            .map_err(crate::storage::StorageError::from)
            .and_then(|json| self.storage.set_item(CART_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, items = self.items.len(), "failed to persist cart");
        }
    }
}

fn normalize(items: Vec<CartLineItem>) -> Vec<CartLineItem> {
    let mut out: Vec<CartLineItem> = Vec::with_capacity(items.len());
    let mut seen: HashMap<ItemKey, usize> = HashMap::new();

    for item in items.into_iter().filter(|item| item.quantity > 0) {
        match seen.get(&item.id) {
            Some(&index) => {
                if let Some(existing) = out.get_mut(index) {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
            }
            None => {
                seen.insert(item.id.clone(), out.len());
                out.push(item);
            }
        }
    }
    out
}
