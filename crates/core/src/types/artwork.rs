//! Catalog entities.

use serde::{Deserialize, Serialize};

use super::id::ArtworkId;
use super::price::normalize_price;

/// A purchasable artwork.
///
/// Titles and artist names are translation keys; resolving them to text is
/// the presentation layer's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: ArtworkId,
    pub image: String,
    pub additional_images: Vec<String>,
    pub title_key: String,
    pub artist_key: String,
    /// Localized display price, e.g. `"45 000 ₴"`.
    pub price: String,
}

impl Artwork {
    /// Numeric price derived from the display string.
    #[must_use]
    pub fn price_value(&self) -> u64 {
        normalize_price(&self.price)
    }

    /// All images, primary first.
    pub fn images(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.image.as_str())
            .chain(self.additional_images.iter().map(String::as_str))
    }
}

/// A highlighted artwork shown outside the main grid.
///
/// Featured entries carry their own price and image, which may differ from
/// the catalog entry they point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedArtwork {
    pub title_key: String,
    pub artist_key: String,
    pub price: String,
    pub image: String,
}
