use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Quiets the chatty layers of this stack: the ORM and its driver, the
/// redis cache and the outbound HTTP clients all log at warn unless
/// RUST_LOG overrides them.
const DEFAULT_FILTER: &str =
    "info,backend=info,sqlx=warn,sea_orm=warn,redis=warn,reqwest=warn,hyper=warn";

pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(false)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
