//! Process configuration read from the environment.

use chrono::Duration;
use thiserror::Error;

const DEV_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a number, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be true or false, got '{value}'")]
    InvalidBool { key: &'static str, value: String },

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("JWT_TTL_MINUTES must be shorter than JWT_REFRESH_TTL_MINUTES")]
    LifetimeOrder,

    #[error("DATABASE_URL is required when USE_PERSISTENT_STORES is enabled")]
    MissingDatabaseUrl,
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Also the token issuer.
    pub app_name: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub bcrypt_cost: u32,
    /// Password for the `superadmin` account created on first start.
    pub seed_superadmin_password: String,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("app_name", &self.app_name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("use_persistent_stores", &self.use_persistent_stores)
            .finish_non_exhaustive()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "DokumenKeuangan".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            jwt_secret: DEV_SECRET.to_string(),
            access_ttl: Duration::minutes(60),
            refresh_ttl: Duration::minutes(20160),
            bcrypt_cost: 12,
            seed_superadmin_password: "password".to_string(),
            use_persistent_stores: false,
            database_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                defaults.jwt_secret.clone()
            }
        };

        let access_minutes = parse_number(&lookup, "JWT_TTL_MINUTES", 60i64)?;
        let refresh_minutes = parse_number(&lookup, "JWT_REFRESH_TTL_MINUTES", 20160i64)?;
        if access_minutes <= 0 {
            return Err(ConfigError::NonPositive("JWT_TTL_MINUTES"));
        }
        if refresh_minutes <= 0 {
            return Err(ConfigError::NonPositive("JWT_REFRESH_TTL_MINUTES"));
        }
        if access_minutes >= refresh_minutes {
            return Err(ConfigError::LifetimeOrder);
        }

        let use_persistent_stores = parse_bool(&lookup, "USE_PERSISTENT_STORES", false)?;
        let database_url = lookup("DATABASE_URL").filter(|s| !s.is_empty());
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        Ok(Self {
            app_name: lookup("APP_NAME").unwrap_or(defaults.app_name),
            host: lookup("APP_HOST").unwrap_or(defaults.host),
            port: parse_number(&lookup, "APP_PORT", defaults.port)?,
            jwt_secret,
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::minutes(refresh_minutes),
            bcrypt_cost: parse_number(&lookup, "BCRYPT_COST", defaults.bcrypt_cost)?,
            seed_superadmin_password: lookup("SEED_SUPERADMIN_PASSWORD")
                .unwrap_or(defaults.seed_superadmin_password),
            use_persistent_stores,
            database_url,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: core::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}

fn parse_bool<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(ConfigError::InvalidBool {
            key,
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.app_name, "DokumenKeuangan");
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8000");
        assert_eq!(cfg.access_ttl, Duration::minutes(60));
        assert_eq!(cfg.refresh_ttl, Duration::minutes(20160));
        assert!(!cfg.use_persistent_stores);
    }

    #[test]
    fn overrides_are_read() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("APP_NAME", "FinDocs"),
            ("APP_PORT", "9000"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_MINUTES", "15"),
            ("JWT_REFRESH_TTL_MINUTES", "120"),
        ]))
        .unwrap();
        assert_eq!(cfg.app_name, "FinDocs");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.access_ttl, Duration::minutes(15));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[("APP_PORT", "eighty")])).unwrap_err(),
            ConfigError::InvalidNumber {
                key: "APP_PORT",
                value: "eighty".to_string()
            }
        );
        assert_eq!(
            AppConfig::from_lookup(lookup(&[
                ("JWT_TTL_MINUTES", "120"),
                ("JWT_REFRESH_TTL_MINUTES", "60"),
            ]))
            .unwrap_err(),
            ConfigError::LifetimeOrder
        );
        assert_eq!(
            AppConfig::from_lookup(lookup(&[("USE_PERSISTENT_STORES", "true")])).unwrap_err(),
            ConfigError::MissingDatabaseUrl
        );
    }

    #[test]
    fn debug_hides_secret() {
        let cfg = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "top-secret")])).unwrap();
        assert!(!format!("{cfg:?}").contains("top-secret"));
    }
}
