use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::state::app_state::AppState;

/// Borrow the database connection or fail with 503 when the state was
/// built without one.
pub fn require_db(state: &AppState) -> Result<&DatabaseConnection, AppError> {
    state
        .db
        .as_ref()
        .ok_or_else(|| AppError::db_unavailable("Database connection is not configured"))
}
