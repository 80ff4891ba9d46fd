//! Email Content Backend
//!
//! REST backend storing email campaign content, templates and promo codes in SQLite.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod html;
mod models;
mod reconcile;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::TokenVerifier;
use config::{Config, LogFormat};
use db::ContentRepository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<ContentRepository>,
    pub verifier: Arc<TokenVerifier>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    init_logging(&config);

    tracing::info!("Starting Email Content Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.uses_dev_secret() {
        tracing::warn!(
            "No token secret configured (HTML_EDITOR_JWT_SECRET). Using the development secret!"
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(ContentRepository::new(pool));

    let state = AppState {
        repo,
        verifier: Arc::new(TokenVerifier::new(&config.jwt_secret)),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let (text, json) = match config.log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text)
        .with(json)
        .init();
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let verifier = state.verifier.clone();

    let account_routes = Router::new()
        // Campaign content
        .route(
            "/campaigns/{campaign_id}/content",
            get(api::get_campaign_content).put(api::put_campaign_content),
        )
        .route(
            "/campaigns/{campaign_id}/content/from-template/{template_id}",
            post(api::create_campaign_content_from_template),
        )
        // Templates
        .route("/templates", post(api::create_template))
        .route(
            "/templates/{template_id}",
            get(api::get_template).put(api::update_template),
        )
        // Promo codes
        .route(
            "/campaigns/{campaign_id}/content/promo-codes",
            post(api::create_promo_code),
        )
        .route(
            "/campaigns/{campaign_id}/content/promo-codes/{promo_code_id}",
            get(api::get_promo_code).put(api::update_promo_code),
        )
        .layer(middleware::from_fn(move |req, next| {
            auth::jwt_auth_layer(verifier.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/accounts/{account_name}", account_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
