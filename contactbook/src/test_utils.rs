//! Test utilities: in-memory databases, a ready-made app state, and HTTP helpers.

use std::str::FromStr;

use axum::http::{StatusCode, header};
use axum_test::TestServer;
use serde_json::json;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{
    AppState, Application,
    api::models::users::UserResponse,
    auth::session::SessionCodec,
    config::{Config, PoolSettings},
};

pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only-0123456789".to_string()),
        ..Default::default()
    };
    config.database.url = "sqlite::memory:".to_string();
    config.database.pool = PoolSettings {
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    config.auth.session.cookie_secure = false;
    config.auth.session.cookie_same_site = "Lax".to_string();
    // Keep hashing cheap; the cost itself is covered in auth::password
    config.auth.password.hash_iterations = 100;
    config
}

/// A fresh, migrated in-memory database.
///
/// Every connection to `sqlite::memory:` is its own database, so the pool holds exactly one
/// connection and never lets it expire.
pub async fn create_test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Failed to parse in-memory database URL")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");

    crate::migrator().run(&pool).await.expect("Failed to run migrations");
    pool
}

pub fn create_test_state(pool: SqlitePool) -> AppState {
    let config = create_test_config();
    AppState::builder()
        .db(pool)
        .sessions(SessionCodec::from_config(&config).expect("Failed to build session codec"))
        .config(config)
        .build()
}

pub async fn create_test_server(pool: SqlitePool) -> TestServer {
    Application::with_pool(create_test_config(), pool)
        .expect("Failed to create application")
        .into_test_server()
}

/// Register through the API, asserting success.
pub async fn register_user(server: &TestServer, email: &str, password: &str) -> UserResponse {
    let response = server
        .post("/users")
        .json(&json!({ "email": email, "password": password, "password2": password }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

/// Log in through the API and return the `name=value` pair to send back as a `Cookie` header.
pub async fn login_cookie(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/users/login")
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status_ok();

    let set_cookie = response.header(header::SET_COOKIE);
    let set_cookie = set_cookie.to_str().expect("Set-Cookie is not ASCII");
    set_cookie
        .split(';')
        .next()
        .expect("Set-Cookie is empty")
        .to_string()
}
