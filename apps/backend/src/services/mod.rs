pub mod avatars;
pub mod email;
pub mod user_cache;
