use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use time::OffsetDateTime;

use crate::db::require_db;
use crate::entities::users;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::current_user::CurrentUser;
use crate::repos::users as users_repo;
use crate::services::avatars::AvatarClient;
use crate::state::app_state::AppState;

/// User shape returned over HTTP. Never exposes the password hash or the
/// stored refresh token.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub confirmed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&users::Model> for UserResponse {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            confirmed: user.confirmed,
            created_at: user.created_at,
        }
    }
}

async fn me(
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let user = users_repo::find_by_email(db, &current_user.email)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::UserNotFound, "User not found"))?;
    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

/// Raw image bytes in the request body; the content type header names the
/// image format.
async fn update_avatar(
    current_user: CurrentUser,
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let avatars = app_state.avatars.as_ref().ok_or_else(|| {
        AppError::unavailable(
            ErrorCode::AvatarUnavailable,
            "Avatar uploads are not configured",
        )
    })?;

    if body.is_empty() {
        return Err(AppError::bad_request(
            ErrorCode::BadRequest,
            "Request body must contain the image bytes",
        ));
    }

    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let public_id = AvatarClient::public_id(&current_user.username, current_user.id);
    let url = avatars.upload(&public_id, &content_type, body).await?;

    let db = require_db(&app_state)?;
    let user = users_repo::find_by_email(db, &current_user.email)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::UserNotFound, "User not found"))?;
    let updated = users_repo::update_avatar(db, user, &url).await?;

    if let Some(cache) = &app_state.cache {
        cache.invalidate(&updated.email).await;
    }

    Ok(HttpResponse::Ok().json(UserResponse::from(&updated)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/me", web::get().to(me))
        .route("/avatar", web::patch().to(update_avatar));
}
