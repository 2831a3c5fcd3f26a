//! Redis-backed cache of user rows keyed by email.
//!
//! The cache is strictly an optimization: every operation degrades to a
//! database lookup, so redis errors are logged and swallowed rather than
//! surfaced to the request.

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::warn;

use crate::entities::users;

const TTL_SECS: u64 = 900;

#[derive(Clone)]
pub struct UserCache {
    conn: ConnectionManager,
}

impl UserCache {
    /// Connect to redis, returning None (with a log line) on failure so
    /// the server starts without a cache.
    pub async fn connect(redis_url: &str) -> Option<Self> {
        let client = match Client::open(redis_url) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "invalid redis url, running without user cache");
                return None;
            }
        };
        match client.get_connection_manager().await {
            Ok(conn) => Some(Self { conn }),
            Err(e) => {
                warn!(error = %e, "redis unreachable, running without user cache");
                None
            }
        }
    }

    fn key(email: &str) -> String {
        format!("user:{email}")
    }

    pub async fn get(&self, email: &str) -> Option<users::Model> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = match conn.get(Self::key(email)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "user cache read failed");
                return None;
            }
        };
        raw.and_then(|json| match serde_json::from_str(&json) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "stale user cache entry, ignoring");
                None
            }
        })
    }

    pub async fn put(&self, user: &users::Model) {
        let json = match serde_json::to_string(user) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize user for cache");
                return;
            }
        };
        let mut conn = self.conn.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(Self::key(&user.email), json, TTL_SECS)
            .await
        {
            warn!(error = %e, "user cache write failed");
        }
    }

    pub async fn invalidate(&self, email: &str) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn.del::<_, ()>(Self::key(email)).await {
            warn!(error = %e, "user cache invalidation failed");
        }
    }
}
