//! # contactbook: a private address book behind a session cookie
//!
//! `contactbook` is a small HTTP service where people register with an email and password, log
//! in, and keep a list of contacts that only they can see or change.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) and stores everything in
//! SQLite through SQLx. Two pieces carry the security model:
//!
//! - The **credential hasher** ([`auth::password`]) stores passwords as salted PBKDF2-HMAC-SHA256
//!   records of the form `sha256:<iterations>:<salt>:<digest>`, so the cost can be raised without
//!   invalidating existing accounts.
//! - The **session guard** ([`auth::guard`]) reads the subject out of a signed session cookie and
//!   checks it against a resource's owner field before any single-contact read or write.
//!
//! Handlers talk to the database through the repositories in [`db::handlers`]; request and
//! response shapes live in [`api::models`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use contactbook::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = contactbook::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     contactbook::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;
pub mod validation;

#[cfg(test)]
pub mod test_utils;

use std::str::FromStr;
use std::time::Duration;

use axum::{
    Json, Router,
    http::{self, HeaderValue},
    routing::{get, post},
};
use bon::Builder;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    auth::session::SessionCodec,
    config::{CorsOrigin, PoolSettings},
    openapi::api_doc,
};
pub use config::Config;
pub use types::{ContactId, UserId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .sessions(SessionCodec::from_config(&config)?)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    /// Signs and reads the session cookie
    pub sessions: SessionCodec,
}

/// Get the contactbook database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn pool_options(settings: &PoolSettings) -> SqlitePoolOptions {
    let seconds = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(seconds(settings.idle_timeout_secs))
        .max_lifetime(seconds(settings.max_lifetime_secs))
}

/// Open the SQLite database, creating the file if needed, and run migrations.
async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    info!("Opening database at {}", config.database.url);
    let pool = pool_options(&config.database.pool).connect_with(options).await?;
    migrator().run(&pool).await?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allow_origin = if config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT, http::Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.cors.allow_credentials);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: account and contact routes, the health check, API docs, and
/// the compression, CORS and tracing layers.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers::{contacts, users};

    let cors_layer = if state.config.cors.allowed_origins.is_empty() {
        None
    } else {
        Some(create_cors_layer(&state.config)?)
    };
    let doc = api_doc(&state.config);
    let served_doc = doc.clone();

    let router = Router::new()
        .route("/users", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/logout", post(users::logout))
        .route("/users/me", get(users::get_current_user))
        .route("/contacts", get(contacts::list_contacts).post(contacts::create_contact))
        .route(
            "/contacts/{id}",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        .route("/healthz", get(|| async { "OK" }))
        .route("/openapi.json", get(move || async move { Json(served_doc) }))
        .with_state(state)
        .merge(Scalar::with_url("/docs", doc))
        .layer(CompressionLayer::new());

    let router = match cors_layer {
        Some(cors) => router.layer(cors),
        None => router,
    };

    Ok(router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    ))
}

pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = setup_database(&config).await?;
        Self::with_pool(config, pool)
    }

    /// Build the application around an existing, already migrated pool.
    pub fn with_pool(config: Config, pool: SqlitePool) -> anyhow::Result<Self> {
        debug!("Starting contactbook with configuration: {:#?}", config.redacted());

        let state = AppState::builder()
            .db(pool.clone())
            .sessions(SessionCodec::from_config(&config)?)
            .config(config.clone())
            .build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "contactbook listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
