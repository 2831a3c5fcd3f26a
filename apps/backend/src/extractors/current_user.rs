use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{verify_token, TokenError, TokenScope};
use crate::db::require_db;
use crate::entities::users;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::auth_token::bearer_token;
use crate::repos::users as users_repo;
use crate::state::app_state::AppState;

/// Authenticated user resolved from the access token on the request.
///
/// The resolved row is served from the redis cache when possible and
/// written back on a miss. The password hash never leaves this module.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub confirmed: bool,
}

impl From<&users::Model> for CurrentUser {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            confirmed: user.confirmed,
        }
    }
}

/// Look up a user by email, cache-first.
pub async fn resolve_user(state: &AppState, email: &str) -> Result<Option<users::Model>, AppError> {
    if let Some(cache) = &state.cache {
        if let Some(user) = cache.get(email).await {
            return Ok(Some(user));
        }
    }

    let db = require_db(state)?;
    let user = users_repo::find_by_email(db, email).await?;

    if let (Some(cache), Some(user)) = (&state.cache, &user) {
        cache.put(user).await;
    }
    Ok(user)
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let token = bearer_token(&req)?;

            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::internal("AppState not available"))?;

            let claims =
                verify_token(&token, TokenScope::Access, &state.security).map_err(|e| match e {
                    TokenError::Expired => AppError::unauthorized_expired_jwt(),
                    _ => AppError::unauthorized_invalid_jwt(),
                })?;

            let user = resolve_user(state, &claims.sub)
                .await?
                .ok_or_else(|| {
                    AppError::unauthorized(ErrorCode::UserNotFound, "Unknown user")
                })?;

            Ok(CurrentUser::from(&user))
        })
    }
}
