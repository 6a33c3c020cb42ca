pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

/// Build the admin router. Exposed so integration tests can drive it directly.
pub fn app(state: AppState) -> Router {
    let admin_routes = Router::new()
        // Book routes
        .route("/api/admin/books", get(routes::books::list).post(routes::books::create))
        .route("/api/admin/books/import", post(routes::books::import))
        .route(
            "/api/admin/books/{id}",
            get(routes::books::get)
                .put(routes::books::update)
                .delete(routes::books::delete),
        )
        // TOC routes
        .route(
            "/api/admin/books/{id}/toc",
            get(routes::toc::get).put(routes::toc::replace),
        )
        .route("/api/admin/books/{id}/toc/rebuild", post(routes::toc::rebuild))
        // Chapter routes
        .route(
            "/api/admin/books/{id}/chapters",
            get(routes::chapters::list).post(routes::chapters::create),
        )
        .route("/api/admin/books/{id}/chapters/import", post(routes::chapters::import))
        .route("/api/admin/books/{id}/chapters/allocate", get(routes::chapters::allocate))
        .route("/api/admin/books/{id}/chapters/reorder", put(routes::chapters::reorder))
        .route(
            "/api/admin/chapters/{id}",
            get(routes::chapters::get)
                .put(routes::chapters::update)
                .delete(routes::chapters::delete),
        );

    Router::new()
        .route("/health", get(health_check))
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url, config.max_connections, config.reorder_offset).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let state = AppState { db: Arc::new(db) };
    let app = app(state);

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
