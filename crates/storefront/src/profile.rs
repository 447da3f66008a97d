//! Per-user profile data kept in the visitor's storage.
//!
//! Profile fields live beside the cart under `<field prefix><user id>` keys,
//! so they are tied to the browser that saved them rather than the account.
//! Stored values override what the identity provider reports.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use gallery_core::{ProfileField, UserId, UserProfile};

use crate::services::auth::AuthUser;
use crate::storage::{KeyValueStore, StorageError};

/// Largest accepted avatar upload (5 MiB).
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// Glyphs offered by the avatar picker.
pub const EMOJI_AVATARS: [&str; 12] = [
    "🎨", "🖌️", "🎭", "🖼️", "🌈", "✨", "🧑‍🎨", "🖍️", "✏️", "🎪", "🌟", "🔮",
];

const MAX_EMOJI_CHARS: usize = 8;

/// Rejected avatar input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AvatarError {
    #[error("avatar file is empty")]
    Empty,

    #[error("avatar is {size} bytes, the limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("avatar must be an image, got {0}")]
    NotAnImage(String),

    #[error("avatar emoji must be a single short glyph")]
    InvalidEmoji,

    #[error("avatar must be a data URI")]
    InvalidDataUri,
}

/// Rejected profile edit.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Avatar(#[from] AvatarError),

    /// Neither the edit, the stored profile nor the provider has a name.
    #[error("display name is required")]
    DisplayNameRequired,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn check_image(mime: &str, size: usize) -> Result<(), AvatarError> {
    if size == 0 {
        return Err(AvatarError::Empty);
    }
    if size > MAX_AVATAR_BYTES {
        return Err(AvatarError::TooLarge {
            size,
            max: MAX_AVATAR_BYTES,
        });
    }
    match mime.strip_prefix("image/") {
        Some(subtype) if !subtype.trim().is_empty() => Ok(()),
        _ if mime.is_empty() => Err(AvatarError::NotAnImage("no content type".to_owned())),
        _ => Err(AvatarError::NotAnImage(mime.to_owned())),
    }
}

/// Build the data URI of a generated emoji avatar.
///
/// The image is a 100×100 indigo square with the glyph centered.
///
/// # Errors
///
/// Returns [`AvatarError::InvalidEmoji`] for blank or overlong input.
pub fn emoji_avatar(glyph: &str) -> Result<String, AvatarError> {
    let glyph = glyph.trim();
    if glyph.is_empty() || glyph.chars().count() > MAX_EMOJI_CHARS || glyph.contains(['<', '>', '&'])
    {
        return Err(AvatarError::InvalidEmoji);
    }

    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"><rect width="100" height="100" fill="#6366f1"/><text x="50" y="60" font-size="50" text-anchor="middle" dominant-baseline="middle">{glyph}</text></svg>"##
    );
    Ok(format!("data:image/svg+xml;utf8,{}", urlencoding::encode(&svg)))
}

/// An uploaded avatar image that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarUpload {
    data_uri: String,
}

impl AvatarUpload {
    /// Check an uploaded file and encode it as a base64 data URI.
    ///
    /// # Errors
    ///
    /// Returns [`AvatarError`] if the file is empty, larger than
    /// [`MAX_AVATAR_BYTES`], or not declared as an `image/*` type.
    pub fn validate(content_type: Option<&str>, bytes: &[u8]) -> Result<Self, AvatarError> {
        let mime = content_type.unwrap_or_default().trim();
        check_image(mime, bytes.len())?;

        Ok(Self {
            data_uri: format!("data:{mime};base64,{}", STANDARD.encode(bytes)),
        })
    }

    /// Check an avatar that arrives already encoded as a data URI.
    ///
    /// Both base64 payloads and percent-encoded ones (the shape of
    /// [`emoji_avatar`]) are accepted. Size is measured on the decoded bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AvatarError::InvalidDataUri`] for anything that is not a
    /// well-formed data URI, otherwise the same errors as
    /// [`validate`](Self::validate).
    pub fn from_data_uri(uri: &str) -> Result<Self, AvatarError> {
        let uri = uri.trim();
        let (header, payload) = uri
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .ok_or(AvatarError::InvalidDataUri)?;

        let mut params = header.split(';');
        let mime = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        let is_base64 = params.any(|param| param.trim().eq_ignore_ascii_case("base64"));

        let size = if is_base64 {
            STANDARD
                .decode(payload.trim())
                .map_err(|_| AvatarError::InvalidDataUri)?
                .len()
        } else {
            urlencoding::decode_binary(payload.as_bytes()).len()
        };
        check_image(&mime, size)?;

        Ok(Self {
            data_uri: uri.to_owned(),
        })
    }

    /// The encoded image.
    #[must_use]
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    #[must_use]
    pub fn into_data_uri(self) -> String {
        self.data_uri
    }
}

/// Profile edits. Blank or absent values leave the stored value as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    /// An image data URI, checked like an upload.
    pub avatar: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
}

/// What the profile page shows for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedProfile {
    pub uid: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub member_since: Option<NaiveDate>,
}

/// Profile fields over a visitor's storage.
#[derive(Debug, Clone)]
pub struct ProfileStore<S> {
    storage: S,
}

impl<S: KeyValueStore> ProfileStore<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Read one field. Unreadable storage reads as absent.
    #[must_use]
    pub fn get(&self, user_id: &UserId, field: ProfileField) -> Option<String> {
        match self.storage.get_item(&field.storage_key(user_id)) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, user_id = %user_id, ?field, "failed to read profile field");
                None
            }
        }
    }

    /// Write one field.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the value cannot be stored, most often
    /// because an uploaded avatar exceeds the storage quota.
    pub fn set(&self, user_id: &UserId, field: ProfileField, value: &str) -> Result<(), StorageError> {
        self.storage.set_item(&field.storage_key(user_id), value)
    }

    /// Delete one field.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be written.
    pub fn remove(&self, user_id: &UserId, field: ProfileField) -> Result<(), StorageError> {
        self.storage.remove_item(&field.storage_key(user_id))
    }

    /// All stored fields of one user.
    #[must_use]
    pub fn load(&self, user_id: &UserId) -> UserProfile {
        let mut profile = UserProfile::default();
        for field in ProfileField::ALL {
            *profile.field_mut(field) = self.get(user_id, field);
        }
        profile
    }

    /// Store the non-blank values of `update` for `user`.
    ///
    /// Values are trimmed. The edit is checked as a whole before anything is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Avatar`] for an avatar that is not a valid
    /// image data URI, [`ProfileError::DisplayNameRequired`] when the name is
    /// blank and neither storage nor the provider has one, or the first
    /// [`ProfileError::Storage`] failure; fields written before it stay.
    pub fn update(&self, user: &AuthUser, update: &ProfileUpdate) -> Result<(), ProfileError> {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };

        let display_name = non_blank(&update.display_name);
        let has_fallback_name = self.get(&user.uid, ProfileField::DisplayName).is_some()
            || non_blank(&user.display_name).is_some();
        if display_name.is_none() && !has_fallback_name {
            return Err(ProfileError::DisplayNameRequired);
        }
        let avatar = non_blank(&update.avatar)
            .map(|uri| AvatarUpload::from_data_uri(&uri))
            .transpose()?;

        if let Some(name) = display_name {
            self.set(&user.uid, ProfileField::DisplayName, &name)?;
        }
        if let Some(avatar) = avatar {
            self.set(&user.uid, ProfileField::Avatar, avatar.data_uri())?;
        }
        if let Some(birth_date) = non_blank(&update.birth_date) {
            self.set(&user.uid, ProfileField::BirthDate, &birth_date)?;
        }
        if let Some(gender) = non_blank(&update.gender) {
            self.set(&user.uid, ProfileField::Gender, &gender)?;
        }
        Ok(())
    }

    /// Merge stored fields over the provider's account data.
    #[must_use]
    pub fn resolve(&self, user: &AuthUser) -> ResolvedProfile {
        let stored = self.load(&user.uid);
        ResolvedProfile {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: stored.display_name.or_else(|| user.display_name.clone()),
            photo_url: stored.avatar.or_else(|| user.photo_url.clone()),
            birth_date: stored.birth_date,
            gender: stored.gender,
            member_since: user.creation_time.map(|t| t.date_naive()),
        }
    }
}
