use actix_web::{web, HttpResponse};
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::state::app_state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: String,
    latest_migration: Option<String>,
    checked_at: String,
}

async fn greeting() -> HttpResponse {
    HttpResponse::Ok().body("Contacts API is up. See /api for the REST surface.")
}

/// Liveness plus a real database round-trip: SELECT 1 and the latest
/// applied migration. Always answers 200 so probes can read the payload;
/// a broken database shows up in the `database` field.
async fn healthchecker(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let (database, latest_migration) = match app_state.db.as_ref() {
        None => ("not configured".to_string(), None),
        Some(db) => {
            let probe = db
                .execute(Statement::from_string(
                    db.get_database_backend(),
                    "SELECT 1".to_string(),
                ))
                .await;
            match probe {
                Ok(_) => {
                    let latest = migration::get_latest_migration_version(db)
                        .await
                        .unwrap_or(None);
                    ("ok".to_string(), latest)
                }
                Err(e) => (format!("error: {e}"), None),
            }
        }
    };

    let checked_at = OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(|e| AppError::internal(format!("Failed to format timestamp: {e}")))?;

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database,
        latest_migration,
        checked_at,
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(greeting))
        .route("/api/healthchecker", web::get().to(healthchecker));
}
