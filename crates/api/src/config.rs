//! Process configuration from environment variables (optionally a `.env` file).

use chrono::TimeDelta;
use thiserror::Error;
use tracing::warn;

use cafeteria_infra::DbConfig;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} is set without {1}")]
    Incomplete(&'static str, &'static str),
}

/// Optional administrator created at startup when missing.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub database: DbConfig,
    pub jwt_secret: String,
    pub token_ttl: TimeDelta,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database", &self.database)
            .field("token_ttl", &self.token_ttl)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish_non_exhaustive()
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source (the process environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let url = lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://cafeteria.db".to_string());
        let max_connections = parse_or("DATABASE_MAX_CONNECTIONS", lookup("DATABASE_MAX_CONNECTIONS"), 5u32)?;
        let ttl_hours = parse_or("TOKEN_TTL_HOURS", lookup("TOKEN_TTL_HOURS"), 24i64)?;
        let token_ttl = TimeDelta::try_hours(ttl_hours)
            .filter(|ttl| *ttl > TimeDelta::zero())
            .ok_or_else(|| ConfigError::Invalid {
                name: "TOKEN_TTL_HOURS",
                value: ttl_hours.to_string(),
                reason: "must be a positive number of hours".to_string(),
            })?;

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            });

        let bootstrap_admin = match (lookup("ADMIN_USERNAME"), lookup("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(BootstrapAdmin { username, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Incomplete("ADMIN_USERNAME", "ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Incomplete("ADMIN_PASSWORD", "ADMIN_USERNAME")),
        };

        Ok(Self {
            bind_addr,
            database: DbConfig {
                url,
                max_connections,
            },
            jwt_secret,
            token_ttl,
            bootstrap_admin,
        })
    }

    /// Throwaway configuration: in-memory database, no bootstrap admin.
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            database: DbConfig::in_memory(),
            jwt_secret: jwt_secret.into(),
            token_ttl: TimeDelta::hours(24),
            bootstrap_admin: None,
        }
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: core::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.database.url, "sqlite://cafeteria.db");
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.token_ttl, TimeDelta::hours(24));
        assert!(cfg.bootstrap_admin.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = ApiConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_HOURS", "1"),
            ("ADMIN_USERNAME", "root"),
            ("ADMIN_PASSWORD", "rootroot"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.database.max_connections, 2);
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.token_ttl, TimeDelta::hours(1));
        assert_eq!(cfg.bootstrap_admin.unwrap().username, "root");
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = ApiConfig::from_lookup(lookup(&[("TOKEN_TTL_HOURS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "TOKEN_TTL_HOURS", .. }));
        assert!(ApiConfig::from_lookup(lookup(&[("TOKEN_TTL_HOURS", "0")])).is_err());
        assert_eq!(
            ApiConfig::from_lookup(lookup(&[("ADMIN_USERNAME", "root")])).unwrap_err(),
            ConfigError::Incomplete("ADMIN_USERNAME", "ADMIN_PASSWORD")
        );
    }
}
