use crate::config::db::DbProfile;
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::services::avatars::AvatarClient;
use crate::services::email::EmailClient;
use crate::services::user_cache::UserCache;
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    security_config: SecurityConfig,
    db_profile: Option<DbProfile>,
    redis_url: Option<String>,
    mailer: Option<EmailClient>,
    avatars: Option<AvatarClient>,
    app_base_url: Option<String>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            security_config: SecurityConfig::default(),
            db_profile: None,
            redis_url: None,
            mailer: None,
            avatars: None,
            app_base_url: None,
        }
    }

    pub fn with_db(mut self, profile: DbProfile) -> Self {
        self.db_profile = Some(profile);
        self
    }

    pub fn with_security(mut self, security_config: SecurityConfig) -> Self {
        self.security_config = security_config;
        self
    }

    pub fn with_redis(mut self, redis_url: impl Into<String>) -> Self {
        self.redis_url = Some(redis_url.into());
        self
    }

    pub fn with_mailer(mut self, mailer: EmailClient) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn with_avatars(mut self, avatars: AvatarClient) -> Self {
        self.avatars = Some(avatars);
        self
    }

    pub fn with_app_base_url(mut self, url: impl Into<String>) -> Self {
        self.app_base_url = Some(url.into());
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let db = match self.db_profile {
            // single entrypoint: connect + migrate
            Some(profile) => Some(bootstrap_db(&profile).await?),
            None => None,
        };

        let cache = match self.redis_url {
            Some(url) => UserCache::connect(&url).await,
            None => None,
        };

        let mut state = match db {
            Some(conn) => AppState::new(conn, self.security_config),
            None => AppState::without_db(self.security_config),
        };
        state.cache = cache;
        state.mailer = self.mailer;
        state.avatars = self.avatars;
        if let Some(url) = self.app_base_url {
            state.app_base_url = url;
        }
        Ok(state)
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
