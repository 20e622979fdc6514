use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{extractors::AuthUser, session::clear_session_cookie},
    error::ApiError,
    state::AppState,
    users::{
        avatars::{upload_avatar, UploadItem},
        dto::{PrivateProfile, PublicProfile},
        services::UpdateProfileInput,
    },
};

/// Upper bound for the profile form, avatar included.
const PROFILE_FORM_LIMIT: usize = 10 * 1024 * 1024;

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).delete(delete_me))
        .route(
            "/me/profile",
            post(update_profile).layer(DefaultBodyLimit::max(PROFILE_FORM_LIMIT)),
        )
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/users/:handle", get(get_profile))
}

pub async fn get_me(AuthUser(user): AuthUser) -> Json<PrivateProfile> {
    Json(PrivateProfile::from(&user))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    state.profiles.delete_account(user.id).await?;
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    ))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<PublicProfile>, ApiError> {
    let user = state.profiles.get_by_handle(&handle).await?;
    Ok(Json(PublicProfile::from(&user)))
}

/// Multipart profile edit. A failed avatar upload keeps the old avatar and
/// still saves the text fields.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut form: Multipart,
) -> Result<Json<PrivateProfile>, ApiError> {
    let mut input = UpdateProfileInput::default();
    let mut avatar = None;

    while let Some(field) = form
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "avatar" {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let body = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            avatar = Some(UploadItem { body, content_type });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let value = text.trim().to_string();
        match name.as_str() {
            "handle" => input.handle = value,
            "display_name" => input.display_name = value,
            "bio" => input.bio = value,
            "country" => input.country = value,
            "instagram" => input.social_links.instagram = value,
            "facebook" => input.social_links.facebook = value,
            "linkedin" => input.social_links.linkedin = value,
            "x" => input.social_links.x = value,
            _ => {}
        }
    }

    if let Some(item) = avatar {
        match upload_avatar(state.storage.as_ref(), user.id, item).await {
            Ok(url) => input.avatar_url = url,
            Err(e) => warn!(error = ?e, "avatar upload failed; keeping previous avatar"),
        }
    }

    let saved = state.profiles.update_profile(user.id, input).await?;
    Ok(Json(PrivateProfile::from(&saved)))
}
