//! Shared setup for integration tests: sqlite-backed AppState plus a few
//! account fixtures.

#![allow(dead_code)]

use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test;
use backend::auth::password::hash_password;
use backend::config::db::DbProfile;
use backend::entities::users;
use backend::infra::state::build_state;
use backend::repos::users as users_repo;
use backend::state::app_state::AppState;
use backend::test_support::{create_test_app_builder, TestAppBuilder};
use serde_json::json;

#[ctor::ctor]
fn init_test_logging() {
    backend_test_support::test_logging::init();
}

/// Fresh in-memory database with migrations applied.
pub async fn test_state() -> AppState {
    build_state()
        .with_db(DbProfile::SqliteMem)
        .build()
        .await
        .expect("state should build with sqlite in-memory db")
}

pub fn create_test_app(state: AppState) -> TestAppBuilder {
    create_test_app_builder(state)
}

/// Insert a user directly, optionally confirmed.
pub async fn create_user(
    state: &AppState,
    email: &str,
    password: &str,
    confirmed: bool,
) -> users::Model {
    let db = state.db.as_ref().expect("test state should have a db");
    let hash = hash_password(password).expect("hashing should succeed");
    let username = email.split('@').next().unwrap_or("user");
    let user = users_repo::create(db, username, email, &hash)
        .await
        .expect("user insert should succeed");
    if confirmed {
        users_repo::confirm_email(db, user)
            .await
            .expect("confirm should succeed")
    } else {
        user
    }
}

/// Log in through the real endpoint and return (access, refresh).
pub async fn login<S>(app: &S, email: &str, password: &str) -> (String, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status().as_u16(), 200, "login should succeed");

    let body: serde_json::Value = test::read_body_json(resp).await;
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// Minimal valid contact payload.
pub fn contact_json(name: &str, email: &str, phone: &str) -> serde_json::Value {
    json!({
        "name": name,
        "last_name": "Tester",
        "email": email,
        "phone": phone,
    })
}
