use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::info;

use crate::models::Identity;
use crate::repository::EventPolicy;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::SecurityHeadersLayer;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    /// Any credential resolves to this identity.
    Development(Identity),
    /// Credentials are looked up in a JSON token table.
    Tokens(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub storage: StorageBackend,
    pub event_policy: EventPolicy,
    pub auth: AuthConfig,
    pub cors_allowed_origins: Vec<String>,
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage = parse_or(&var, "STORAGE_BACKEND", StorageBackend::Postgres)?;
        let database_url = var("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let auth = match var("AUTH_MODE").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("development") | Some("dev") => AuthConfig::Development(Identity {
                uid: var("DEV_USER_UID").unwrap_or_else(|| "test-uid".to_string()),
                email: var("DEV_USER_EMAIL").unwrap_or_else(|| "test@example.com".to_string()),
                name: var("DEV_USER_NAME").unwrap_or_else(|| "Test User".to_string()),
                picture: var("DEV_USER_PICTURE"),
            }),
            Some("tokens") => AuthConfig::Tokens(
                var("AUTH_TOKENS_FILE")
                    .map(PathBuf::from)
                    .ok_or(ConfigError::Missing("AUTH_TOKENS_FILE"))?,
            ),
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "AUTH_MODE",
                    value: other.to_string(),
                    reason: "expected 'development' or 'tokens'".to_string(),
                })
            }
        };

        let cors_allowed_origins = split_origins(
            var("CORS_ALLOWED_ORIGINS")
                .as_deref()
                .unwrap_or(cors::DEFAULT_ALLOWED_ORIGINS),
        );

        let production = var("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        Ok(Self {
            port: parse_or(&var, "PORT", DEFAULT_PORT)?,
            database_url,
            database_max_connections: parse_or(
                &var,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
            storage,
            event_policy: EventPolicy {
                require_future_event_date: parse_or(&var, "REQUIRE_FUTURE_EVENT_DATE", true)?,
            },
            auth,
            cors_allowed_origins,
            production,
        })
    }
}

fn split_origins(list: &str) -> Vec<String> {
    list.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

fn parse_or<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Postgres => f.write_str("postgres"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/events")]).unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert!(config.event_policy.require_future_event_date);
        assert_eq!(
            config.cors_allowed_origins,
            vec![
                "http://localhost:3000",
                "http://localhost:5173",
                "http://localhost:5174"
            ]
        );
        assert!(!config.production);
        match config.auth {
            AuthConfig::Development(identity) => assert_eq!(identity.email, "test@example.com"),
            other => panic!("unexpected auth config {other:?}"),
        }
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("DATABASE_URL"))));

        let config = load(&[("STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("PORT", "8080"),
            ("REQUIRE_FUTURE_EVENT_DATE", "false"),
            ("AUTH_MODE", "tokens"),
            ("AUTH_TOKENS_FILE", "/etc/events/tokens.json"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, ,http://b.test"),
            ("RUST_ENV", "Production"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert!(!config.event_policy.require_future_event_date);
        assert_eq!(
            config.auth,
            AuthConfig::Tokens(PathBuf::from("/etc/events/tokens.json"))
        );
        assert_eq!(config.cors_allowed_origins, vec!["http://a.test", "http://b.test"]);
        assert!(config.production);

        let config = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("CORS_ALLOWED_ORIGINS", "*"),
        ])
        .unwrap();
        assert_eq!(config.cors_allowed_origins, vec!["*"]);
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("STORAGE_BACKEND", "memory"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));

        let err = load(&[("STORAGE_BACKEND", "memory"), ("AUTH_MODE", "oauth")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "AUTH_MODE", .. }));

        let err = load(&[("STORAGE_BACKEND", "memory"), ("AUTH_MODE", "tokens")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AUTH_TOKENS_FILE")));
    }
}
