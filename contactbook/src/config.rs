//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The file path
//! defaults to `config.yaml` and can be changed with `-f` or `CONTACTBOOK_CONFIG`.
//!
//! ## Loading Priority
//!
//! Later sources override earlier ones:
//!
//! 1. **YAML config file** (default: `config.yaml`)
//! 2. **Environment variables** prefixed with `CONTACTBOOK_`
//! 3. **DATABASE_URL**, which overrides `database.url` if set
//!
//! Nested values use double underscores, e.g. `CONTACTBOOK_AUTH__SESSION__COOKIE_SECURE=false`.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use contactbook::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::password::DEFAULT_ITERATIONS;
use crate::errors::Error;

/// Shortest session lifetime accepted by [`Config::validate`].
const MIN_SESSION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Longest session lifetime accepted by [`Config::validate`].
const MAX_SESSION_TIMEOUT: Duration = Duration::from_secs(90 * 24 * 60 * 60);

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "CONTACTBOOK_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Root configuration, loaded from YAML and environment variables.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Shorthand for `database.url`, populated from `DATABASE_URL`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub database: DatabaseConfig,
    /// Key used to sign session cookies. Required.
    pub secret_key: Option<String>,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_url: None,
            database: DatabaseConfig::default(),
            secret_key: None,
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// SQLite database settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite connection string, e.g. `sqlite://contactbook.db`
    pub url: String,
    pub pool: PoolSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://contactbook.db".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

/// Connection pool parameters passed through to SQLx.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Time before idle connections are closed (seconds, 0 = never)
    pub idle_timeout_secs: u64,
    /// Maximum lifetime of a connection (seconds, 0 = never)
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub session: SessionConfig,
    pub password: PasswordConfig,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// How long a login stays valid
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Cookie name for the session token
    pub cookie_name: String,
    /// Set Secure flag on cookies (HTTPS only)
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("Strict", "Lax", or "None")
    pub cookie_same_site: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(14 * 24 * 60 * 60),
            cookie_name: "contactbook_session".to_string(),
            cookie_secure: true,
            cookie_same_site: "Strict".to_string(),
        }
    }
}

/// Password rules and hashing cost.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length, in characters
    pub min_length: usize,
    /// Maximum password length, in characters
    pub max_length: usize,
    /// PBKDF2 iteration count for newly stored credentials. Existing records keep their own.
    pub hash_iterations: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 1,
            max_length: 128,
            hash_iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// CORS configuration for browser clients. No CORS layer is installed when
/// `allowed_origins` is empty.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allow_credentials: true,
            max_age: Some(3600),
        }
    }
}

/// Either `*` or a specific origin URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.secret_key.as_deref().is_none_or(str::is_empty) {
            return Err(invalid(
                "secret_key is not configured. Set CONTACTBOOK_SECRET_KEY or add secret_key to the config file.",
            ));
        }

        let password = &self.auth.password;
        if password.min_length < 1 {
            return Err(invalid("password min_length must be at least 1"));
        }
        if password.min_length > password.max_length {
            return Err(invalid(&format!(
                "password min_length ({}) cannot be greater than max_length ({})",
                password.min_length, password.max_length
            )));
        }
        if password.hash_iterations == 0 {
            return Err(invalid("password hash_iterations must be greater than 0"));
        }

        let timeout = self.auth.session.timeout;
        if timeout < MIN_SESSION_TIMEOUT {
            return Err(invalid("session timeout is too short (minimum 5 minutes)"));
        }
        if timeout > MAX_SESSION_TIMEOUT {
            return Err(invalid("session timeout is too long (maximum 90 days)"));
        }

        if !matches!(self.auth.session.cookie_same_site.as_str(), "Strict" | "Lax" | "None") {
            return Err(invalid(&format!(
                "session cookie_same_site must be one of Strict, Lax or None, got '{}'",
                self.auth.session.cookie_same_site
            )));
        }
        if self.auth.session.cookie_same_site == "None" && !self.auth.session.cookie_secure {
            return Err(invalid(
                "session cookie_same_site=None requires cookie_secure=true; browsers drop the cookie otherwise",
            ));
        }

        let has_wildcard = self.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard));
        if has_wildcard && self.cors.allow_credentials {
            return Err(invalid(
                "CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins.",
            ));
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("CONTACTBOOK_").ignore(&["config"]).split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// A copy safe to log, with the secret key masked.
    pub fn redacted(&self) -> Self {
        Self {
            secret_key: self.secret_key.as_ref().map(|_| "<redacted>".to_string()),
            ..self.clone()
        }
    }
}

fn invalid(reason: &str) -> Error {
    Error::Internal {
        operation: format!("Config validation: {reason}"),
    }
}
