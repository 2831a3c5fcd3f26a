use actix_extensible_rate_limit::backend::memory::InMemoryBackend;
use actix_extensible_rate_limit::RateLimiter;
use actix_web::{web, App, HttpServer};
use backend::config::db::DbProfile;
use backend::infra::state::build_state;
use backend::middleware::cors::cors_middleware;
use backend::middleware::rate_limit::{api_rate_limit_config, auth_rate_limit_config};
use backend::middleware::request_trace::RequestTrace;
use backend::middleware::structured_logger::StructuredLogger;
use backend::routes;
use backend::services::avatars::AvatarClient;
use backend::services::email::EmailClient;
use backend::state::security_config::SecurityConfig;
use backend::telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // .env is optional; real deployments set the environment directly.
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("BACKEND_PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse::<u16>()
        .unwrap_or_else(|_| {
            eprintln!("BACKEND_PORT must be a valid port number");
            std::process::exit(1);
        });

    let jwt = match std::env::var("JWT_SECRET") {
        Ok(jwt) => jwt,
        Err(_) => {
            eprintln!("JWT_SECRET must be set");
            std::process::exit(1);
        }
    };
    let security_config = SecurityConfig::new(jwt.as_bytes());

    let mut builder = build_state()
        .with_db(DbProfile::Prod)
        .with_security(security_config);
    if let Ok(redis_url) = std::env::var("REDIS_URL") {
        builder = builder.with_redis(redis_url);
    }
    if let Some(mailer) = EmailClient::from_env() {
        builder = builder.with_mailer(mailer);
    }
    if let Some(avatars) = AvatarClient::from_env() {
        builder = builder.with_avatars(avatars);
    }
    if let Ok(base_url) = std::env::var("APP_BASE_URL") {
        builder = builder.with_app_base_url(base_url);
    }

    let app_state = match builder.build().await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(host = %host, port = %port, "starting contacts backend");

    let data = web::Data::new(app_state);
    let rate_limit_store = InMemoryBackend::builder().build();

    HttpServer::new(move || {
        let auth_limiter = RateLimiter::builder(
            rate_limit_store.clone(),
            auth_rate_limit_config().build(),
        )
        .add_headers()
        .build();
        let users_limiter = RateLimiter::builder(
            rate_limit_store.clone(),
            api_rate_limit_config().build(),
        )
        .add_headers()
        .build();
        let contacts_limiter = RateLimiter::builder(
            rate_limit_store.clone(),
            api_rate_limit_config().build(),
        )
        .add_headers()
        .build();

        App::new()
            .wrap(cors_middleware())
            .wrap(StructuredLogger)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::health::configure_routes)
            .service(
                web::scope("/api/auth")
                    .wrap(auth_limiter)
                    .configure(routes::auth::configure_routes),
            )
            .service(
                web::scope("/api/users")
                    .wrap(users_limiter)
                    .configure(routes::users::configure_routes),
            )
            .service(
                web::scope("/api/contacts")
                    .wrap(contacts_limiter)
                    .configure(routes::contacts::configure_routes),
            )
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
