//! Static artwork catalog.
//!
//! The catalog is seeded once at startup and never mutated. Titles and artist
//! names are translation keys resolved by the client.

use std::sync::Arc;

use gallery_core::{Artwork, ArtworkId, FeaturedArtwork, NewLineItem};

/// Read-only catalog of artworks and featured entries.
#[derive(Debug, Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

#[derive(Debug)]
struct CatalogInner {
    artworks: Vec<Artwork>,
    featured: Vec<FeaturedArtwork>,
}

impl Catalog {
    /// Build a catalog from explicit entries.
    #[must_use]
    pub fn new(artworks: Vec<Artwork>, featured: Vec<FeaturedArtwork>) -> Self {
        Self {
            inner: Arc::new(CatalogInner { artworks, featured }),
        }
    }

    /// The gallery's built-in collection.
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(seed_artworks(), seed_featured())
    }

    /// All artworks in display order.
    #[must_use]
    pub fn artworks(&self) -> &[Artwork] {
        &self.inner.artworks
    }

    /// Featured entries in display order.
    #[must_use]
    pub fn featured(&self) -> &[FeaturedArtwork] {
        &self.inner.featured
    }

    /// Look up an artwork by id.
    #[must_use]
    pub fn artwork(&self, id: ArtworkId) -> Option<&Artwork> {
        self.inner.artworks.iter().find(|a| a.id == id)
    }

    /// Look up an artwork by its title key.
    #[must_use]
    pub fn by_title_key(&self, title_key: &str) -> Option<&Artwork> {
        self.inner.artworks.iter().find(|a| a.title_key == title_key)
    }

    /// Cart request for the featured entry at `index`.
    ///
    /// The entry is matched to a catalog artwork by title key so that adding
    /// it merges with the same artwork added from the grid.
    #[must_use]
    pub fn featured_line_item(&self, index: usize) -> Option<NewLineItem> {
        let featured = self.inner.featured.get(index)?;
        let source = self.by_title_key(&featured.title_key);
        Some(NewLineItem::from_featured(featured, source))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::seeded()
    }
}

fn artwork(id: i32, image: &str, price: &str, additional: [&str; 3]) -> Artwork {
    Artwork {
        id: ArtworkId::new(id),
        image: image.to_owned(),
        additional_images: additional.iter().map(|s| (*s).to_owned()).collect(),
        title_key: format!("artwork{id}"),
        artist_key: format!("artist{id}"),
        price: price.to_owned(),
    }
}

fn seed_artworks() -> Vec<Artwork> {
    vec![
        artwork(
            1,
            "https://images.unsplash.com/photo-1656332693864-8a7ea5976605?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
            "45 000 ₴",
            [
                "https://images.unsplash.com/photo-1579783902614-a3fb3927b6a5?w=500",
                "https://images.unsplash.com/photo-1578926288207-a90a9ac7c9e0?w=500",
                "https://images.unsplash.com/photo-1547891654-e66ed7ebb968?w=500",
            ],
        ),
        artwork(
            2,
            "https://images.unsplash.com/photo-1716901548718-da465a9060fe?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
            "52 000 ₴",
            [
                "https://images.unsplash.com/photo-1541961017774-22349e4a1262?w=500",
                "https://images.unsplash.com/photo-1549887534-1541e9326642?w=500",
                "https://images.unsplash.com/photo-1556139954-ec19cce61d61?w=500",
            ],
        ),
        artwork(
            3,
            "https://images.unsplash.com/photo-1678117699040-b89738399ca7?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
            "38 000 ₴",
            [
                "https://images.unsplash.com/photo-1567359781514-3b964e2b04d6?w=500",
                "https://images.unsplash.com/photo-1577083165233-566d0c43e1a8?w=500",
                "https://images.unsplash.com/photo-1555514685-00fdb57f78b5?w=500",
            ],
        ),
        artwork(
            4,
            "https://images.unsplash.com/photo-1665779736808-047a6bbf43a0?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
            "41 000 ₴",
            [
                "https://images.unsplash.com/photo-1536924430914-91f9e2041b83?w=500",
                "https://images.unsplash.com/photo-1494438639946-1ebd1d20bf85?w=500",
                "https://images.unsplash.com/photo-1513519245088-0e3d0b8c3b87?w=500",
            ],
        ),
        artwork(
            5,
            "https://images.unsplash.com/photo-1684871431989-f02c4ed999fe?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
            "48 000 ₴",
            [
                "https://images.unsplash.com/photo-1559827260-dc66d52bef19?w=500",
                "https://images.unsplash.com/photo-1547826039-bfc35e0f1ea8?w=500",
                "https://images.unsplash.com/photo-1558618666-fcd25c85cd64?w=500",
            ],
        ),
        artwork(
            6,
            "https://images.unsplash.com/photo-1688588426729-dc4f7bdb8fbe?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1080",
            "55 000 ₴",
            [
                "https://images.unsplash.com/photo-1515405295579-ba7b45403062?w=500",
                "https://images.unsplash.com/photo-1533158326339-7f3cf2404354?w=500",
                "https://images.unsplash.com/photo-1518640552666-93f03308e67e?w=500",
            ],
        ),
    ]
}

fn seed_featured() -> Vec<FeaturedArtwork> {
    vec![
        FeaturedArtwork {
            title_key: "artwork2".to_owned(),
            artist_key: "artist2".to_owned(),
            price: "52 000 ₴".to_owned(),
            image: "https://images.unsplash.com/photo-1716901548718-da465a9060fe?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1200".to_owned(),
        },
        FeaturedArtwork {
            title_key: "artwork3".to_owned(),
            artist_key: "artist3".to_owned(),
            price: "61 500 ₴".to_owned(),
            image: "https://images.unsplash.com/photo-1505761671935-60b3a7427bad?crop=entropy&cs=tinysrgb&fit=max&fm=jpg&q=80&w=1400".to_owned(),
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gallery_core::ItemKey;

    #[test]
    fn test_seeded_catalog() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.artworks().len(), 6);
        assert_eq!(catalog.featured().len(), 2);

        let first = catalog.artwork(ArtworkId::new(1)).unwrap();
        assert_eq!(first.title_key, "artwork1");
        assert_eq!(first.price_value(), 45_000);
        assert_eq!(first.images().count(), 4);
    }

    #[test]
    fn test_unknown_artwork() {
        assert!(Catalog::seeded().artwork(ArtworkId::new(99)).is_none());
    }

    #[test]
    fn test_featured_line_item_merges_with_catalog_id() {
        let catalog = Catalog::seeded();
        let item = catalog.featured_line_item(1).unwrap();
        assert_eq!(item.id, ItemKey::Artwork(ArtworkId::new(3)));
        // The featured price wins over the catalog's 38 000.
        assert_eq!(item.resolved_price(), 61_500);
        assert!(catalog.featured_line_item(2).is_none());
    }

    #[test]
    fn test_featured_without_catalog_match_uses_title_key() {
        let catalog = Catalog::new(
            Vec::new(),
            vec![FeaturedArtwork {
                title_key: "artwork9".to_owned(),
                artist_key: "artist9".to_owned(),
                price: "10 000 ₴".to_owned(),
                image: "f.jpg".to_owned(),
            }],
        );
        let item = catalog.featured_line_item(0).unwrap();
        assert_eq!(item.id, ItemKey::Synthetic("artwork9".to_owned()));
    }
}
