use actix_web::web;

pub mod auth;
pub mod contacts;
pub mod health;
pub mod users;

/// Full route table without rate limiting (tests use this directly;
/// main.rs re-assembles the same scopes with limiters wrapped in).
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure_routes)
        .service(web::scope("/api/auth").configure(auth::configure_routes))
        .service(web::scope("/api/users").configure(users::configure_routes))
        .service(web::scope("/api/contacts").configure(contacts::configure_routes));
}
