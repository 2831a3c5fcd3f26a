use std::time::SystemTime;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::auth::jwt::{mint_token, verify_token, TokenError, TokenScope};
use crate::auth::password::{hash_password, verify_password};
use crate::db::require_db;
use crate::entities::users;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::auth_token::AuthToken;
use crate::extractors::validated_json::ValidatedJson;
use crate::repos::users as users_repo;
use crate::routes::users::UserResponse;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct NewPasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

const CHECK_EMAIL_DETAIL: &str = "Check your email for further instructions";

fn validate_signup(req: &SignupRequest) -> Result<(), AppError> {
    if req.username.trim().is_empty() {
        return Err(AppError::validation(
            ErrorCode::ValidationError,
            "Username cannot be empty",
        ));
    }
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(AppError::validation(
            ErrorCode::ValidationError,
            "A valid email address is required",
        ));
    }
    if req.password.len() < 6 {
        return Err(AppError::validation(
            ErrorCode::ValidationError,
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

/// Mint a scoped email token and send the matching email off the request
/// path. Delivery failures are logged inside the client, never surfaced.
fn spawn_email(state: &AppState, user: &users::Model, scope: TokenScope) {
    let Some(mailer) = state.mailer.clone() else {
        info!(email = %user.email, "mailer not configured, skipping email");
        return;
    };

    let token = match mint_token(&user.email, scope, SystemTime::now(), &state.security) {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(error = %e, "failed to mint email token, skipping email");
            return;
        }
    };

    let to = user.email.clone();
    let username = user.username.clone();
    let base = state.app_base_url.clone();
    tokio::spawn(async move {
        match scope {
            TokenScope::Email => {
                let link = format!("{base}/api/auth/confirmed_email/{token}");
                mailer.send_confirmation(&to, &username, &link).await;
            }
            TokenScope::PasswordReset => {
                let link = format!("{base}/api/auth/reset_password/confirm/{token}");
                mailer.send_password_reset(&to, &username, &link).await;
            }
            _ => {}
        }
    });
}

async fn signup(
    req: ValidatedJson<SignupRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    validate_signup(&req)?;

    let db = require_db(&app_state)?;
    if users_repo::find_by_email(db, &req.email).await?.is_some() {
        return Err(AppError::conflict(
            ErrorCode::AccountExists,
            "An account with this email already exists",
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user = users_repo::create(db, &req.username, &req.email, &password_hash).await?;

    spawn_email(&app_state, &user, TokenScope::Email);

    Ok(HttpResponse::Created().json(json!({
        "user": UserResponse::from(&user),
        "detail": "User successfully created. Check your email to confirm the account",
    })))
}

async fn login(
    req: ValidatedJson<LoginRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let user = users_repo::find_by_email(db, &req.email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !user.confirmed {
        return Err(AppError::email_not_confirmed());
    }
    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::invalid_credentials());
    }

    let pair = issue_token_pair(&app_state, user).await?;
    Ok(HttpResponse::Ok().json(pair))
}

/// Mint a new access/refresh pair and persist the refresh token on the
/// user row, rotating out whatever was stored before.
async fn issue_token_pair(
    app_state: &AppState,
    user: users::Model,
) -> Result<TokenPair, AppError> {
    let now = SystemTime::now();
    let access_token = mint_token(&user.email, TokenScope::Access, now, &app_state.security)?;
    let refresh_token = mint_token(&user.email, TokenScope::Refresh, now, &app_state.security)?;

    let db = require_db(app_state)?;
    let updated =
        users_repo::update_refresh_token(db, user, Some(refresh_token.clone())).await?;
    if let Some(cache) = &app_state.cache {
        cache.put(&updated).await;
    }

    Ok(TokenPair {
        access_token,
        refresh_token,
        token_type: "bearer",
    })
}

async fn refresh_token(
    token: AuthToken,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let claims = verify_token(&token.token, TokenScope::Refresh, &app_state.security).map_err(
        |e| match e {
            TokenError::Expired => AppError::unauthorized_expired_jwt(),
            _ => AppError::invalid_refresh_token(),
        },
    )?;

    let db = require_db(&app_state)?;
    let user = users_repo::find_by_email(db, &claims.sub)
        .await?
        .ok_or_else(AppError::invalid_refresh_token)?;

    // A presented token that is valid but no longer the stored one means
    // it leaked or was already rotated; drop the stored token entirely.
    if user.refresh_token.as_deref() != Some(token.token.as_str()) {
        let cleared = users_repo::update_refresh_token(db, user, None).await?;
        if let Some(cache) = &app_state.cache {
            cache.invalidate(&cleared.email).await;
        }
        return Err(AppError::invalid_refresh_token());
    }

    let pair = issue_token_pair(&app_state, user).await?;
    Ok(HttpResponse::Ok().json(pair))
}

async fn confirmed_email(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = path.into_inner();
    let claims = verify_token(&token, TokenScope::Email, &app_state.security).map_err(|_| {
        AppError::validation(
            ErrorCode::InvalidEmailToken,
            "Invalid token for email verification",
        )
    })?;

    let db = require_db(&app_state)?;
    let user = users_repo::find_by_email(db, &claims.sub)
        .await?
        .ok_or_else(|| {
            AppError::bad_request(ErrorCode::VerificationFailed, "Verification error")
        })?;

    if user.confirmed {
        return Ok(HttpResponse::Ok().json(json!({
            "message": "Your email is already confirmed",
        })));
    }

    users_repo::confirm_email(db, user).await?;
    if let Some(cache) = &app_state.cache {
        cache.invalidate(&claims.sub).await;
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Email confirmed" })))
}

async fn request_email(
    req: ValidatedJson<EmailRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    match users_repo::find_by_email(db, &req.email).await? {
        Some(user) if user.confirmed => {
            return Ok(HttpResponse::Ok().json(json!({
                "message": "Your email is already confirmed",
            })));
        }
        Some(user) => spawn_email(&app_state, &user, TokenScope::Email),
        // Unknown addresses get the same answer as known ones.
        None => {}
    }

    Ok(HttpResponse::Ok().json(json!({ "message": CHECK_EMAIL_DETAIL })))
}

async fn reset_password(
    req: ValidatedJson<EmailRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    if let Some(user) = users_repo::find_by_email(db, &req.email).await? {
        if user.confirmed {
            spawn_email(&app_state, &user, TokenScope::PasswordReset);
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "message": CHECK_EMAIL_DETAIL })))
}

async fn reset_password_confirm(
    path: web::Path<String>,
    req: ValidatedJson<NewPasswordRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = path.into_inner();
    let claims =
        verify_token(&token, TokenScope::PasswordReset, &app_state.security).map_err(|_| {
            AppError::validation(
                ErrorCode::InvalidResetToken,
                "Invalid token for password reset",
            )
        })?;

    let db = require_db(&app_state)?;
    let user = users_repo::find_by_email(db, &claims.sub)
        .await?
        .ok_or_else(|| {
            AppError::unavailable(ErrorCode::UserNotFound, "Password reset verification failed")
        })?;

    if req.password.len() < 6 {
        return Err(AppError::validation(
            ErrorCode::ValidationError,
            "Password must be at least 6 characters",
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let updated = users_repo::update_password(db, user, &password_hash).await?;
    if let Some(cache) = &app_state.cache {
        cache.invalidate(&updated.email).await;
    }

    if let Some(mailer) = app_state.mailer.clone() {
        let to = updated.email.clone();
        let username = updated.username.clone();
        tokio::spawn(async move {
            mailer.send_password_changed(&to, &username).await;
        });
    }

    Ok(HttpResponse::Ok().json(json!({
        "user": UserResponse::from(&updated),
        "detail": "Password updated",
    })))
}

async fn reset_password_done() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Reset instructions sent. Follow the link in your email",
    }))
}

async fn reset_password_complete() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Password reset complete. You can now log in with the new password",
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/signup", web::post().to(signup))
        .route("/login", web::post().to(login))
        .route("/refresh_token", web::get().to(refresh_token))
        .route("/confirmed_email/{token}", web::get().to(confirmed_email))
        .route("/request_email", web::post().to(request_email))
        .route("/reset_password", web::post().to(reset_password))
        .route(
            "/reset_password/confirm/{token}",
            web::post().to(reset_password_confirm),
        )
        .route("/reset_password/done", web::get().to(reset_password_done))
        .route(
            "/reset_password/complete",
            web::get().to(reset_password_complete),
        );
}
