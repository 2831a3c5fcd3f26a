use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Iso8601;
use time::{Date, OffsetDateTime};

use crate::db::require_db;
use crate::entities::contacts;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::current_user::CurrentUser;
use crate::extractors::validated_json::ValidatedJson;
use crate::http::pagination::{Page, PageParams};
use crate::repos::contacts as contacts_repo;
use crate::repos::contacts::{ContactInput, FieldFilters};
use crate::state::app_state::AppState;

const MAX_NAME: usize = 30;
const MAX_LAST_NAME: usize = 40;
const MAX_DESCRIPTION: usize = 3000;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// ISO date, e.g. "1990-04-17"
    pub birthday: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// Exact/substring field filters shared by the search endpoints.
#[derive(Debug, Deserialize)]
pub struct FieldQuery {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<FieldQuery> for FieldFilters {
    fn from(q: FieldQuery) -> Self {
        Self {
            name: q.name,
            last_name: q.last_name,
            email: q.email,
            phone: q.phone,
        }
    }
}

/// Contact shape returned over HTTP; the owner id stays internal.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: Option<String>,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<contacts::Model> for ContactResponse {
    fn from(c: contacts::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            last_name: c.last_name,
            email: c.email,
            phone: c.phone,
            birthday: c.birthday.map(|d| d.to_string()),
            description: c.description,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

fn parse_input(req: ContactRequest) -> Result<ContactInput, AppError> {
    if req.name.trim().is_empty() || req.name.len() > MAX_NAME {
        return Err(AppError::validation(
            ErrorCode::ValidationError,
            format!("Name must be between 1 and {MAX_NAME} characters"),
        ));
    }
    if req.last_name.trim().is_empty() || req.last_name.len() > MAX_LAST_NAME {
        return Err(AppError::validation(
            ErrorCode::ValidationError,
            format!("Last name must be between 1 and {MAX_LAST_NAME} characters"),
        ));
    }
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(AppError::validation(
            ErrorCode::ValidationError,
            "A valid email address is required",
        ));
    }
    if req.phone.trim().is_empty() {
        return Err(AppError::validation(
            ErrorCode::ValidationError,
            "Phone cannot be empty",
        ));
    }
    if let Some(description) = &req.description {
        if description.len() > MAX_DESCRIPTION {
            return Err(AppError::validation(
                ErrorCode::ValidationError,
                format!("Description must be at most {MAX_DESCRIPTION} characters"),
            ));
        }
    }

    let birthday = match req.birthday.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(Date::parse(raw, &Iso8601::DATE).map_err(|_| {
            AppError::validation(
                ErrorCode::ValidationError,
                "Birthday must be an ISO date (YYYY-MM-DD)",
            )
        })?),
    };

    Ok(ContactInput {
        name: req.name,
        last_name: req.last_name,
        email: req.email,
        phone: req.phone,
        birthday,
        description: req.description,
    })
}

fn to_page_response(page: Page<contacts::Model>) -> HttpResponse {
    HttpResponse::Ok().json(page.map(ContactResponse::from))
}

async fn owned_contact(
    app_state: &AppState,
    user_id: i64,
    contact_id: i64,
) -> Result<contacts::Model, AppError> {
    let db = require_db(app_state)?;
    contacts_repo::get(db, user_id, contact_id)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::ContactNotFound, "Contact not found"))
}

async fn list(
    current_user: CurrentUser,
    params: web::Query<PageParams>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let page = contacts_repo::list(db, current_user.id, &params).await?;
    Ok(to_page_response(page))
}

async fn get_one(
    current_user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let contact = owned_contact(&app_state, current_user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ContactResponse::from(contact)))
}

async fn create(
    current_user: CurrentUser,
    req: ValidatedJson<ContactRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let input = parse_input(req.into_inner())?;
    let db = require_db(&app_state)?;
    let contact = contacts_repo::create(db, current_user.id, input).await?;
    Ok(HttpResponse::Created().json(ContactResponse::from(contact)))
}

async fn update(
    current_user: CurrentUser,
    path: web::Path<i64>,
    req: ValidatedJson<ContactRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let input = parse_input(req.into_inner())?;
    let contact = owned_contact(&app_state, current_user.id, path.into_inner()).await?;
    let db = require_db(&app_state)?;
    let updated = contacts_repo::update(db, current_user.id, contact, input).await?;
    Ok(HttpResponse::Ok().json(ContactResponse::from(updated)))
}

async fn rename(
    current_user: CurrentUser,
    path: web::Path<i64>,
    req: ValidatedJson<RenameRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let name = req.into_inner().name;
    if name.trim().is_empty() || name.len() > MAX_NAME {
        return Err(AppError::validation(
            ErrorCode::ValidationError,
            format!("Name must be between 1 and {MAX_NAME} characters"),
        ));
    }

    let contact = owned_contact(&app_state, current_user.id, path.into_inner()).await?;
    let db = require_db(&app_state)?;
    let updated = contacts_repo::rename(db, contact, name).await?;
    Ok(HttpResponse::Ok().json(ContactResponse::from(updated)))
}

async fn remove(
    current_user: CurrentUser,
    path: web::Path<i64>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let contact = owned_contact(&app_state, current_user.id, path.into_inner()).await?;
    let db = require_db(&app_state)?;
    let removed = contacts_repo::remove(db, contact).await?;
    Ok(HttpResponse::Ok().json(ContactResponse::from(removed)))
}

async fn search_birthdays(
    current_user: CurrentUser,
    path: web::Path<i64>,
    params: web::Query<PageParams>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let days = path.into_inner();
    if !(0..=366).contains(&days) {
        return Err(AppError::validation(
            ErrorCode::ValidationError,
            "Days must be between 0 and 366",
        ));
    }

    let db = require_db(&app_state)?;
    let today = OffsetDateTime::now_utc().date();
    let page =
        contacts_repo::upcoming_birthdays(db, current_user.id, days, today, &params).await?;
    Ok(to_page_response(page))
}

async fn search_exact(
    current_user: CurrentUser,
    query: web::Query<FieldQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let filters = FieldFilters::from(query.into_inner());
    if filters.is_empty() {
        return Err(AppError::not_found(
            ErrorCode::NotFound,
            "Provide at least one of name, last_name, email, phone",
        ));
    }

    let db = require_db(&app_state)?;
    let contact = contacts_repo::search_exact(db, current_user.id, &filters)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::ContactNotFound, "Contact not found"))?;
    Ok(HttpResponse::Ok().json(ContactResponse::from(contact)))
}

async fn search_any(
    current_user: CurrentUser,
    path: web::Path<String>,
    params: web::Query<PageParams>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let page = contacts_repo::search_any(db, current_user.id, &path, &params).await?;
    Ok(to_page_response(page))
}

async fn search_like(
    current_user: CurrentUser,
    path: web::Path<String>,
    params: web::Query<PageParams>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let page = contacts_repo::search_like_any(db, current_user.id, &path, &params).await?;
    Ok(to_page_response(page))
}

async fn search_like_fields(
    current_user: CurrentUser,
    query: web::Query<FieldQuery>,
    params: web::Query<PageParams>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let filters = FieldFilters::from(query.into_inner());
    if filters.is_empty() {
        return Err(AppError::not_found(
            ErrorCode::NotFound,
            "Provide at least one of name, last_name, email, phone",
        ));
    }

    let db = require_db(&app_state)?;
    let page =
        contacts_repo::search_like_fields(db, current_user.id, &filters, &params).await?;
    Ok(to_page_response(page))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Search routes are registered before the `{id}` matcher.
    cfg.route("/search/birthdays/{days}", web::get().to(search_birthdays))
        .route("/search/exact", web::get().to(search_exact))
        .route("/search/any/{q}", web::get().to(search_any))
        .route("/search/like/{q}", web::get().to(search_like))
        .route("/search/like-fields", web::get().to(search_like_fields))
        .route("", web::get().to(list))
        .route("", web::post().to(create))
        .route("/{id}", web::get().to(get_one))
        .route("/{id}", web::put().to(update))
        .route("/{id}", web::delete().to(remove))
        .route("/{id}/name", web::patch().to(rename));
}
