use std::env;

use crate::error::AppError;

/// Database profile for different environments.
#[derive(Debug, Clone, PartialEq)]
pub enum DbProfile {
    /// Production database, resolved from DATABASE_URL
    Prod,
    /// Test database, resolved from TEST_DATABASE_URL - enforces safety rules
    Test,
    /// Private in-memory sqlite, used by the integration test harness
    SqliteMem,
}

/// Resolve the connection URL for a profile.
pub fn db_url(profile: &DbProfile) -> Result<String, AppError> {
    match profile {
        DbProfile::Prod => must_var("DATABASE_URL"),
        DbProfile::Test => {
            let url = must_var("TEST_DATABASE_URL")?;
            guard_test_db_name(&url)?;
            Ok(url)
        }
        DbProfile::SqliteMem => Ok("sqlite::memory:".to_string()),
    }
}

/// Enforce safety: test DB name must end with "_test".
fn guard_test_db_name(url: &str) -> Result<(), AppError> {
    let db_name = url.rsplit('/').next().unwrap_or("");
    let db_name = db_name.split('?').next().unwrap_or("");
    if !db_name.ends_with("_test") {
        return Err(AppError::config(format!(
            "Test profile requires database name to end with '_test', but got: '{db_name}'"
        )));
    }
    Ok(())
}

/// Get required environment variable or return error
fn must_var(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::config(format!("Required environment variable '{name}' is not set")))
}
