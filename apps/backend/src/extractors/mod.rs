pub mod auth_token;
pub mod current_user;
pub mod validated_json;
