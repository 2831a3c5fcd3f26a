use sea_orm::DatabaseConnection;

use super::security_config::SecurityConfig;
use crate::services::avatars::AvatarClient;
use crate::services::email::EmailClient;
use crate::services::user_cache::UserCache;

/// Application state containing shared resources.
///
/// External services are optional: the database is absent in some test
/// scenarios, and the cache, mailer and avatar host are all features the
/// server degrades gracefully without.
#[derive(Clone)]
pub struct AppState {
    /// Database connection (optional for test scenarios)
    pub db: Option<DatabaseConnection>,
    /// Redis-backed user lookup cache
    pub cache: Option<UserCache>,
    /// Outbound transactional email
    pub mailer: Option<EmailClient>,
    /// Image host used for avatar uploads
    pub avatars: Option<AvatarClient>,
    /// Security configuration including JWT settings
    pub security: SecurityConfig,
    /// Public base URL used when composing emailed links
    pub app_base_url: String,
}

impl AppState {
    /// Create a new AppState with the given database connection and security config
    pub fn new(db: DatabaseConnection, security: SecurityConfig) -> Self {
        Self {
            db: Some(db),
            cache: None,
            mailer: None,
            avatars: None,
            security,
            app_base_url: "http://localhost:8000".to_string(),
        }
    }

    /// Create a new AppState without a database connection (for testing)
    pub fn without_db(security: SecurityConfig) -> Self {
        Self {
            db: None,
            cache: None,
            mailer: None,
            avatars: None,
            security,
            app_base_url: "http://localhost:8000".to_string(),
        }
    }

    /// Create a test AppState without database connection
    #[cfg(test)]
    pub fn for_tests_without_db() -> Self {
        Self::without_db(SecurityConfig::default())
    }
}
