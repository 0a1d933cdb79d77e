//! Process configuration, read once from the environment at startup.

use thiserror::Error;

use taskgate_auth::token::{DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS};

pub const DEV_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Upper bound for token lifetimes (about five years).
pub const MAX_TTL_SECS: i64 = 5 * 365 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer no larger than five years, got {value:?}")]
    InvalidSeconds { name: &'static str, value: String },

    #[error("{name} must be true/false/1/0, got {value:?}")]
    InvalidFlag { name: &'static str, value: String },

    #[error("USE_PERSISTENT_STORES is set but DATABASE_URL is missing")]
    MissingDatabaseUrl,
}

/// Operator credentials for the startup admin.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub bind_addr: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("use_persistent_stores", &self.use_persistent_stores)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// In-memory stores, default lifetimes, no bootstrap admin.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            use_persistent_stores: false,
            database_url: None,
            bootstrap_admin: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let mut config = Self::with_secret(jwt_secret);

        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(raw) = get("ACCESS_TOKEN_TTL_SECS") {
            config.access_ttl_secs = parse_seconds("ACCESS_TOKEN_TTL_SECS", &raw)?;
        }
        if let Some(raw) = get("REFRESH_TOKEN_TTL_SECS") {
            config.refresh_ttl_secs = parse_seconds("REFRESH_TOKEN_TTL_SECS", &raw)?;
        }
        if let Some(raw) = get("USE_PERSISTENT_STORES") {
            config.use_persistent_stores = parse_flag("USE_PERSISTENT_STORES", &raw)?;
        }
        config.database_url = get("DATABASE_URL");
        if config.use_persistent_stores && config.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        config.bootstrap_admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!("ADMIN_EMAIL and ADMIN_PASSWORD must both be set; skipping admin bootstrap");
                None
            }
            (None, None) => None,
        };

        Ok(config)
    }
}

fn parse_seconds(name: &'static str, raw: &str) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 && n <= MAX_TTL_SECS => Ok(n),
        _ => Err(ConfigError::InvalidSeconds {
            name,
            value: raw.to_string(),
        }),
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: raw.to_string(),
        }),
    }
}
