//! Blogging Backend - library for app logic and testing

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

pub use config::AppConfig;
pub use state::AppState;

/// Global request body cap
const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// CORS restricted to the configured allow-list of frontend origins.
pub fn configure_cors(config: &AppConfig) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config);

    Router::new()
        .route("/", get(routes::health::liveness))
        .route("/health", get(routes::health::health_ping))
        .route("/health/ready", get(routes::health::health_ready))
        .route("/jwt", post(routes::auth::issue_token))
        // blogs
        .route(
            "/blogs",
            get(routes::blogs::list_blogs).post(routes::blogs::create_blog),
        )
        .route(
            "/blogs/{id}",
            get(routes::blogs::get_blog).delete(routes::blogs::delete_blog),
        )
        .route("/latest-blogs", get(routes::blogs::latest_blogs))
        .route("/blog", get(routes::blogs::blogs_by_email))
        .route(
            "/blog/{id}",
            get(routes::blogs::get_own_blog).put(routes::blogs::update_blog),
        )
        // reviews
        .route(
            "/review",
            get(routes::reviews::list_reviews).post(routes::reviews::create_review),
        )
        .route(
            "/review/{id}",
            get(routes::reviews::get_review)
                .put(routes::reviews::update_review)
                .delete(routes::reviews::delete_review),
        )
        // profiles
        .route(
            "/profile",
            get(routes::profiles::profiles_by_email).post(routes::profiles::create_profile),
        )
        .route(
            "/profiles/{id}",
            get(routes::profiles::get_profile).put(routes::profiles::update_profile),
        )
        // contact
        .route(
            "/contact",
            get(routes::contact::list_contacts).post(routes::contact::create_contact),
        )
        // bookmarks
        .route("/save-blogs", post(routes::saved_blogs::save_blog))
        .route("/saved-blogs", get(routes::saved_blogs::saved_blogs_by_email))
        // authors
        .route("/addAuthor", post(routes::authors::create_author))
        .route("/authors", get(routes::authors::list_authors))
        .route("/authors/{id}", get(routes::authors::get_author))
        // users
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/users/{id}",
            get(routes::users::get_user).delete(routes::users::delete_user),
        )
        .route(
            "/users/admin/{key}",
            get(routes::users::admin_status).put(routes::users::make_admin),
        )
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

/// Run the server (used by main).
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();

    // Guards MUST be held for the programme's lifetime; dropping them early
    // shuts down background log-writer threads and loses buffered log lines.
    let _log_guards = logging::init(&config);

    routes::health::init_start_time();
    config.validate()?;

    let store = db::connect_store(&config.db).await?;
    let latency = store.ping().await?;
    tracing::info!(
        backend = store.backend(),
        latency_ms = %latency.as_millis(),
        "Document store reachable"
    );

    let addr = config.bind_addr()?;
    let app = create_app(AppState::new(config, store));

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
