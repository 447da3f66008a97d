//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create integer ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe integer ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
///
/// # Example
///
/// ```rust
/// # use gallery_core::define_id;
/// define_id!(ArtistId);
/// define_id!(ExhibitionId);
///
/// let artist = ArtistId::new(1);
/// assert_eq!(artist.as_i32(), 1);
///
/// // These are different types, so this won't compile:
/// // let _: ArtistId = ExhibitionId::new(1);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(ArtworkId);

/// Identifier of a cart line item.
///
/// Catalog artworks are keyed by their numeric id. Featured entries that have
/// no catalog counterpart are keyed by their title key instead. Serialized
/// untagged, so stored carts hold either a JSON number or a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemKey {
    /// A catalog artwork.
    Artwork(ArtworkId),
    /// A synthetic key for entries outside the catalog.
    Synthetic(String),
}

impl ItemKey {
    /// Parse a key from a URL path segment.
    ///
    /// Segments that parse as an `i32` are artwork ids; anything else is a
    /// synthetic key.
    #[must_use]
    pub fn from_segment(segment: &str) -> Self {
        segment.parse::<i32>().map_or_else(
            |_| Self::Synthetic(segment.to_owned()),
            |id| Self::Artwork(ArtworkId::new(id)),
        )
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artwork(id) => write!(f, "{id}"),
            Self::Synthetic(key) => f.write_str(key),
        }
    }
}

impl From<ArtworkId> for ItemKey {
    fn from(id: ArtworkId) -> Self {
        Self::Artwork(id)
    }
}

/// Opaque user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a provider-issued identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_item_key_serializes_untagged() {
        let artwork = ItemKey::Artwork(ArtworkId::new(3));
        assert_eq!(serde_json::to_string(&artwork).unwrap(), "3");

        let synthetic = ItemKey::Synthetic("artwork3".to_string());
        assert_eq!(serde_json::to_string(&synthetic).unwrap(), "\"artwork3\"");
    }

    #[test]
    fn test_item_key_deserializes_number_or_string() {
        let key: ItemKey = serde_json::from_str("7").unwrap();
        assert_eq!(key, ItemKey::Artwork(ArtworkId::new(7)));

        let key: ItemKey = serde_json::from_str("\"featured\"").unwrap();
        assert_eq!(key, ItemKey::Synthetic("featured".to_string()));
    }

    #[test]
    fn test_item_key_from_segment() {
        assert_eq!(
            ItemKey::from_segment("12"),
            ItemKey::Artwork(ArtworkId::new(12))
        );
        assert_eq!(
            ItemKey::from_segment("artwork3"),
            ItemKey::Synthetic("artwork3".to_string())
        );
    }

    #[test]
    fn test_item_key_display() {
        assert_eq!(ItemKey::Artwork(ArtworkId::new(1)).to_string(), "1");
        assert_eq!(ItemKey::Synthetic("x".to_string()).to_string(), "x");
    }
}
