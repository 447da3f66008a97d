//! Per-user profile fields.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// A profile attribute stored per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    DisplayName,
    /// An image URL or inline data URI.
    Avatar,
    BirthDate,
    Gender,
}

impl ProfileField {
    /// Every field, in display order.
    pub const ALL: [Self; 4] = [
        Self::DisplayName,
        Self::Avatar,
        Self::BirthDate,
        Self::Gender,
    ];

    /// Storage key prefix for this field.
    #[must_use]
    pub const fn key_prefix(self) -> &'static str {
        match self {
            Self::DisplayName => "userDisplayName_",
            Self::Avatar => "userAvatar_",
            Self::BirthDate => "userBirthDate_",
            Self::Gender => "userGender_",
        }
    }

    /// Storage key for this field of one user, e.g. `userAvatar_<uid>`.
    #[must_use]
    pub fn storage_key(self, user_id: &UserId) -> String {
        format!("{}{}", self.key_prefix(), user_id.as_str())
    }
}

/// Stored profile values for one user. Absent fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
}

impl UserProfile {
    /// Value of one field.
    #[must_use]
    pub fn field(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::DisplayName => self.display_name.as_deref(),
            ProfileField::Avatar => self.avatar.as_deref(),
            ProfileField::BirthDate => self.birth_date.as_deref(),
            ProfileField::Gender => self.gender.as_deref(),
        }
    }

    /// Mutable slot for one field.
    pub const fn field_mut(&mut self, field: ProfileField) -> &mut Option<String> {
        match field {
            ProfileField::DisplayName => &mut self.display_name,
            ProfileField::Avatar => &mut self.avatar,
            ProfileField::BirthDate => &mut self.birth_date,
            ProfileField::Gender => &mut self.gender,
        }
    }
}
