//! Cart line items.

use serde::{Deserialize, Serialize};

use super::artwork::{Artwork, FeaturedArtwork};
use super::id::ItemKey;
use super::price::normalize_price;

/// One distinct purchasable entry in a cart.
///
/// Display fields are copied when the item is added so the cart renders
/// without consulting the catalog. The serialized form is what gets
/// persisted under the `cart` storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: ItemKey,
    pub quantity: u32,
    /// Unit price in whole currency units.
    pub price_value: u64,
    pub title: String,
    pub artist: String,
    pub image: String,
    /// Display price as it was shown when the item was added.
    pub price: String,
}

impl CartLineItem {
    /// `quantity × price_value`, saturating.
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.price_value.saturating_mul(u64::from(self.quantity))
    }
}

/// A request to add something to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub id: ItemKey,
    pub title: String,
    pub artist: String,
    pub image: String,
    pub price: String,
    /// Explicit unit price; zero or absent means "derive from `price`".
    pub price_value: Option<u64>,
    /// Quantity to add; zero is treated as one.
    pub quantity: u32,
}

impl NewLineItem {
    /// Build a request for one unit of a catalog artwork.
    #[must_use]
    pub fn from_artwork(artwork: &Artwork) -> Self {
        Self {
            id: ItemKey::Artwork(artwork.id),
            title: artwork.title_key.clone(),
            artist: artwork.artist_key.clone(),
            image: artwork.image.clone(),
            price: artwork.price.clone(),
            price_value: None,
            quantity: 1,
        }
    }

    /// Build a request for one unit of a featured entry.
    ///
    /// When `source` is the catalog artwork the entry refers to, the line item
    /// shares its id (and therefore merges with it); otherwise the title key
    /// becomes a synthetic id. The featured price wins over the catalog price.
    #[must_use]
    pub fn from_featured(featured: &FeaturedArtwork, source: Option<&Artwork>) -> Self {
        let id = source.map_or_else(
            || ItemKey::Synthetic(featured.title_key.clone()),
            |artwork| ItemKey::Artwork(artwork.id),
        );
        let price = if featured.price.is_empty() {
            source.map(|a| a.price.clone()).unwrap_or_default()
        } else {
            featured.price.clone()
        };

        Self {
            id,
            title: featured.title_key.clone(),
            artist: featured.artist_key.clone(),
            image: source.map_or_else(|| featured.image.clone(), |a| a.image.clone()),
            price_value: Some(normalize_price(&price)),
            price,
            quantity: 1,
        }
    }

    /// Set the quantity to add.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Unit price: the explicit value when non-zero, else the digits of the
    /// display price.
    #[must_use]
    pub fn resolved_price(&self) -> u64 {
        match self.price_value {
            Some(value) if value > 0 => value,
            _ => normalize_price(&self.price),
        }
    }

    /// Quantity to add, never less than one.
    #[must_use]
    pub const fn effective_quantity(&self) -> u32 {
        if self.quantity == 0 { 1 } else { self.quantity }
    }

    /// Materialize the request as a fresh line item.
    #[must_use]
    pub fn into_line_item(self) -> CartLineItem {
        let price_value = self.resolved_price();
        let quantity = self.effective_quantity();
        CartLineItem {
            id: self.id,
            quantity,
            price_value,
            title: self.title,
            artist: self.artist,
            image: self.image,
            price: self.price,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ArtworkId;

    fn artwork() -> Artwork {
        Artwork {
            id: ArtworkId::new(2),
            image: "catalog.jpg".to_string(),
            additional_images: Vec::new(),
            title_key: "artwork2".to_string(),
            artist_key: "artist2".to_string(),
            price: "52 000 ₴".to_string(),
        }
    }

    fn featured(title_key: &str, price: &str) -> FeaturedArtwork {
        FeaturedArtwork {
            title_key: title_key.to_string(),
            artist_key: "artist3".to_string(),
            price: price.to_string(),
            image: "featured.jpg".to_string(),
        }
    }

    #[test]
    fn test_resolved_price_prefers_explicit_value() {
        let mut item = NewLineItem::from_artwork(&artwork());
        assert_eq!(item.resolved_price(), 52_000);

        item.price_value = Some(10);
        assert_eq!(item.resolved_price(), 10);

        item.price_value = Some(0);
        assert_eq!(item.resolved_price(), 52_000);
    }

    #[test]
    fn test_effective_quantity_never_zero() {
        let item = NewLineItem::from_artwork(&artwork()).with_quantity(0);
        assert_eq!(item.effective_quantity(), 1);
        assert_eq!(item.into_line_item().quantity, 1);
    }

    #[test]
    fn test_featured_with_catalog_source_shares_id() {
        let source = artwork();
        let item = NewLineItem::from_featured(&featured("artwork2", "52 000 ₴"), Some(&source));
        assert_eq!(item.id, ItemKey::Artwork(ArtworkId::new(2)));
        assert_eq!(item.image, "catalog.jpg");
        assert_eq!(item.resolved_price(), 52_000);
    }

    #[test]
    fn test_featured_without_source_uses_title_key() {
        let item = NewLineItem::from_featured(&featured("artwork3", "61 500 ₴"), None);
        assert_eq!(item.id, ItemKey::Synthetic("artwork3".to_string()));
        assert_eq!(item.image, "featured.jpg");
        assert_eq!(item.resolved_price(), 61_500);
    }

    #[test]
    fn test_line_item_serializes_camel_case() {
        let line = NewLineItem::from_artwork(&artwork()).into_line_item();
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["priceValue"], 52_000);
        assert_eq!(json["quantity"], 1);
        assert_eq!(line.line_total(), 52_000);
    }
}
