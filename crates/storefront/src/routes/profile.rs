//! Profile route handlers. All require a signed-in user.

use axum::{
    Json,
    extract::{Multipart, multipart::MultipartError},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument};

use gallery_core::ProfileField;

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::profile::{self, AvatarUpload, MAX_AVATAR_BYTES, ProfileUpdate, ResolvedProfile};

/// Multipart field carrying the avatar file.
pub const AVATAR_FIELD: &str = "avatar";

/// Emoji avatar request body.
#[derive(Debug, Deserialize)]
pub struct EmojiAvatarRequest {
    pub emoji: String,
}

/// Show the resolved profile.
#[instrument(skip_all, fields(user_id = %user.uid))]
pub async fn show(RequireUser { visitor, user }: RequireUser) -> Json<ResolvedProfile> {
    let profiles = visitor.lock().profiles();
    Json(profiles.resolve(&user))
}

/// Update profile fields. Blank values keep what is stored.
#[instrument(skip_all, fields(user_id = %user.uid))]
pub async fn update(
    RequireUser { visitor, user }: RequireUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ResolvedProfile>> {
    let profiles = visitor.lock().profiles();
    profiles.update(&user, &update)?;
    info!("profile updated");
    Ok(Json(profiles.resolve(&user)))
}

/// Use a generated emoji avatar.
#[instrument(skip_all, fields(user_id = %user.uid))]
pub async fn emoji_avatar(
    RequireUser { visitor, user }: RequireUser,
    Json(request): Json<EmojiAvatarRequest>,
) -> Result<Json<ResolvedProfile>> {
    let data_uri = profile::emoji_avatar(&request.emoji)?;
    let profiles = visitor.lock().profiles();
    profiles.set(&user.uid, ProfileField::Avatar, &data_uri)?;
    Ok(Json(profiles.resolve(&user)))
}

/// Upload an avatar image as the `avatar` multipart field.
#[instrument(skip_all, fields(user_id = %user.uid))]
pub async fn upload_avatar(
    RequireUser { visitor, user }: RequireUser,
    mut multipart: Multipart,
) -> Result<Json<ResolvedProfile>> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some(AvatarUpload::validate(content_type.as_deref(), &bytes)?);
        break;
    }
    let upload = upload.ok_or_else(|| {
        AppError::BadRequest(format!("missing multipart field `{AVATAR_FIELD}`"))
    })?;

    let profiles = visitor.lock().profiles();
    profiles.set(&user.uid, ProfileField::Avatar, upload.data_uri())?;
    info!("avatar uploaded");
    Ok(Json(profiles.resolve(&user)))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("avatar must be at most {MAX_AVATAR_BYTES} bytes"))
    } else {
        AppError::BadRequest(err.body_text())
    }
}
