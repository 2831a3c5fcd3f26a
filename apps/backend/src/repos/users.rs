//! User repository functions (generic over ConnectionTrait).

use md5::{Digest, Md5};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use time::OffsetDateTime;

use crate::entities::users;
use crate::error::AppError;

/// Gravatar URL for an email, per their hashing rules (trim + lowercase
/// before the md5). New accounts start with this as their avatar until
/// they upload one.
fn gravatar_url(email: &str) -> String {
    let digest = Md5::digest(email.trim().to_lowercase().as_bytes());
    let hash: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("https://www.gravatar.com/avatar/{hash}")
}

pub async fn find_by_email<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    email: &str,
) -> Result<Option<users::Model>, AppError> {
    let user = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(conn)
        .await?;
    Ok(user)
}

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<users::Model, AppError> {
    let now = OffsetDateTime::now_utc();
    let user = users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash.to_string()),
        avatar_url: Set(Some(gravatar_url(email))),
        refresh_token: Set(None),
        confirmed: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(user.insert(conn).await?)
}

pub async fn update_refresh_token<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user: users::Model,
    refresh_token: Option<String>,
) -> Result<users::Model, AppError> {
    let mut active: users::ActiveModel = user.into();
    active.refresh_token = Set(refresh_token);
    active.updated_at = Set(OffsetDateTime::now_utc());
    Ok(active.update(conn).await?)
}

pub async fn confirm_email<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user: users::Model,
) -> Result<users::Model, AppError> {
    let mut active: users::ActiveModel = user.into();
    active.confirmed = Set(true);
    active.updated_at = Set(OffsetDateTime::now_utc());
    Ok(active.update(conn).await?)
}

pub async fn update_password<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user: users::Model,
    password_hash: &str,
) -> Result<users::Model, AppError> {
    let mut active: users::ActiveModel = user.into();
    active.password_hash = Set(password_hash.to_string());
    // A password change invalidates the stored refresh token as well.
    active.refresh_token = Set(None);
    active.updated_at = Set(OffsetDateTime::now_utc());
    Ok(active.update(conn).await?)
}

pub async fn update_avatar<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user: users::Model,
    avatar_url: &str,
) -> Result<users::Model, AppError> {
    let mut active: users::ActiveModel = user.into();
    active.avatar_url = Set(Some(avatar_url.to_string()));
    active.updated_at = Set(OffsetDateTime::now_utc());
    Ok(active.update(conn).await?)
}

#[cfg(test)]
mod tests {
    use super::gravatar_url;

    #[test]
    fn gravatar_url_matches_known_hash() {
        assert_eq!(
            gravatar_url("grace@example.test"),
            "https://www.gravatar.com/avatar/9468d641ed2f6e958391104d49df2f26"
        );
    }

    #[test]
    fn gravatar_hashing_normalizes_case_and_whitespace() {
        assert_eq!(
            gravatar_url(" Grace@Example.TEST "),
            gravatar_url("grace@example.test")
        );
    }
}
