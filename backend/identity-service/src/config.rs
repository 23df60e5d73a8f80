//! Configuration management for Identity Service
//!
//! Loads settings once at startup from environment variables (plus a `.env`
//! file in debug builds). Request handling code receives the resulting
//! immutable `Settings` by injection and never reads the environment.
//!
//! # Example
//!
//! ```no_run
//! use identity_service::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     println!("Listening on {}:{}", settings.server.host, settings.server.port);
//!     Ok(())
//! }
//! ```

use anyhow::{bail, Context, Result};
use crypto_core::jwt::{TokenCodecConfig, MAX_TTL_SECS, MIN_SECRET_BYTES};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Longest accepted per-request deadline
const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub jwt: JwtSettings,
    pub session: SessionSettings,
    pub database: Option<DatabaseSettings>,
    pub environment: String,
    pub app_origin: String,
}

impl Settings {
    /// Load settings, reading `.env` first in debug builds
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) && dotenvy::dotenv().is_ok() {
            info!("Loaded .env file for development");
        }

        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        Ok(Settings {
            server: ServerSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            session: SessionSettings::from_env()?,
            database: DatabaseSettings::from_env()?,
            environment: env::var("APP_ENV")
                .or_else(|_| env::var("SERVICE_ENV"))
                .unwrap_or_else(|_| "development".to_string()),
            app_origin: env_or("APP_ORIGIN", "http://localhost:3000"),
        }
        .validated()?)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    fn validated(self) -> Result<Self> {
        if self.session.rotation_threshold_secs < 0 {
            bail!(
                "REFRESH_ROTATION_THRESHOLD_SECS must not be negative, got {}",
                self.session.rotation_threshold_secs
            );
        }
        if self.session.rotation_threshold_secs >= self.jwt.refresh_ttl_secs {
            bail!(
                "REFRESH_ROTATION_THRESHOLD_SECS ({}) must be shorter than REFRESH_TOKEN_TTL_SECS ({})",
                self.session.rotation_threshold_secs,
                self.jwt.refresh_ttl_secs
            );
        }
        Ok(self)
    }
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub api_prefix: String,
    pub request_timeout_secs: u64,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        let request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", 10)?;
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&request_timeout_secs) {
            bail!(
                "REQUEST_TIMEOUT_SECS must be between 1 and {}, got {}",
                MAX_REQUEST_TIMEOUT_SECS,
                request_timeout_secs
            );
        }

        Ok(Self {
            host: env_or("SERVER_HOST", "0.0.0.0"),
            port: parse_env("SERVER_PORT", 5001)?,
            api_prefix: env_or("API_PREFIX", "/auth/api/v1"),
            request_timeout_secs,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Token signing settings
#[derive(Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub audience: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("audience", &self.audience)
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let access_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let refresh_secret =
            env::var("JWT_REFRESH_SECRET").context("JWT_REFRESH_SECRET must be set")?;

        if access_secret.len() < MIN_SECRET_BYTES || refresh_secret.len() < MIN_SECRET_BYTES {
            bail!("JWT_SECRET and JWT_REFRESH_SECRET must be at least {MIN_SECRET_BYTES} bytes");
        }
        if access_secret == refresh_secret {
            bail!("JWT_SECRET and JWT_REFRESH_SECRET must differ");
        }

        let settings = Self {
            access_secret,
            refresh_secret,
            audience: env_or("JWT_AUDIENCE", "user"),
            access_ttl_secs: parse_env("ACCESS_TOKEN_TTL_SECS", 15 * 60)?,
            refresh_ttl_secs: parse_env("REFRESH_TOKEN_TTL_SECS", 30 * 24 * 3600)?,
        };

        for (key, ttl) in [
            ("ACCESS_TOKEN_TTL_SECS", settings.access_ttl_secs),
            ("REFRESH_TOKEN_TTL_SECS", settings.refresh_ttl_secs),
        ] {
            if !(1..=MAX_TTL_SECS).contains(&ttl) {
                bail!("{key} must be between 1 and {MAX_TTL_SECS}, got {ttl}");
            }
        }

        Ok(settings)
    }

    pub fn codec_config(&self) -> TokenCodecConfig {
        TokenCodecConfig {
            access_secret: self.access_secret.clone(),
            refresh_secret: self.refresh_secret.clone(),
            audience: self.audience.clone(),
            access_ttl_secs: self.access_ttl_secs,
            refresh_ttl_secs: self.refresh_ttl_secs,
        }
    }
}

/// Session lifecycle settings
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub rotation_threshold_secs: i64,
    pub validate_requires_session: bool,
}

impl SessionSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            rotation_threshold_secs: parse_env("REFRESH_ROTATION_THRESHOLD_SECS", 3600)?,
            validate_requires_session: parse_env("VALIDATE_REQUIRES_SESSION", false)?,
        })
    }
}

/// Database connection settings; absent when `DATABASE_URL` is unset
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseSettings {
    fn from_env() -> Result<Option<Self>> {
        let Ok(url) = env::var("DATABASE_URL") else {
            return Ok(None);
        };

        Ok(Some(Self {
            url,
            max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
        }))
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "JWT_SECRET",
        "JWT_REFRESH_SECRET",
        "JWT_AUDIENCE",
        "ACCESS_TOKEN_TTL_SECS",
        "REFRESH_TOKEN_TTL_SECS",
        "REFRESH_ROTATION_THRESHOLD_SECS",
        "VALIDATE_REQUIRES_SESSION",
        "SERVER_PORT",
        "REQUEST_TIMEOUT_SECS",
        "DATABASE_URL",
        "APP_ENV",
        "SERVICE_ENV",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn set_secrets() {
        env::set_var("JWT_SECRET", "access-secret-for-config-tests-000000");
        env::set_var("JWT_REFRESH_SECRET", "refresh-secret-for-config-tests-00000");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        set_secrets();

        let settings = Settings::from_env().unwrap();

        assert_eq!(settings.server.port, 5001);
        assert_eq!(settings.server.api_prefix, "/auth/api/v1");
        assert_eq!(settings.jwt.audience, "user");
        assert_eq!(settings.jwt.access_ttl_secs, 900);
        assert_eq!(settings.jwt.refresh_ttl_secs, 2_592_000);
        assert_eq!(settings.session.rotation_threshold_secs, 3600);
        assert!(!settings.session.validate_requires_session);
        assert!(settings.database.is_none());
        assert!(!settings.is_production());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        set_secrets();
        env::set_var("SERVER_PORT", "6001");
        env::set_var("VALIDATE_REQUIRES_SESSION", "true");
        env::set_var("DATABASE_URL", "postgres://localhost/identity");
        env::set_var("SERVICE_ENV", "production");

        let settings = Settings::from_env().unwrap();

        assert_eq!(settings.server.port, 6001);
        assert!(settings.session.validate_requires_session);
        assert_eq!(settings.database.as_ref().unwrap().max_connections, 10);
        assert!(settings.is_production());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_rejects_missing_short_or_shared_secrets() {
        clear_env();
        assert!(Settings::from_env().is_err());

        env::set_var("JWT_SECRET", "short");
        env::set_var("JWT_REFRESH_SECRET", "refresh-secret-for-config-tests-00000");
        assert!(Settings::from_env().is_err());

        env::set_var("JWT_SECRET", "refresh-secret-for-config-tests-00000");
        assert!(Settings::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_rejects_bad_numbers_and_threshold() {
        clear_env();
        set_secrets();

        env::set_var("SERVER_PORT", "not-a-port");
        assert!(Settings::from_env().is_err());
        env::remove_var("SERVER_PORT");

        env::set_var("REFRESH_TOKEN_TTL_SECS", "600");
        env::set_var("REFRESH_ROTATION_THRESHOLD_SECS", "3600");
        assert!(Settings::from_env().is_err());
        env::remove_var("REFRESH_ROTATION_THRESHOLD_SECS");

        // Lifetimes that would overflow timestamp arithmetic at request time
        env::set_var("REFRESH_TOKEN_TTL_SECS", "1000000000000000");
        assert!(Settings::from_env().is_err());
        env::remove_var("REFRESH_TOKEN_TTL_SECS");

        env::set_var("ACCESS_TOKEN_TTL_SECS", &(MAX_TTL_SECS + 1).to_string());
        assert!(Settings::from_env().is_err());
        env::set_var("ACCESS_TOKEN_TTL_SECS", "0");
        assert!(Settings::from_env().is_err());
        env::remove_var("ACCESS_TOKEN_TTL_SECS");

        env::set_var("REFRESH_ROTATION_THRESHOLD_SECS", "-1");
        assert!(Settings::from_env().is_err());
        env::remove_var("REFRESH_ROTATION_THRESHOLD_SECS");

        for timeout in ["0", "18446744073709551615"] {
            env::set_var("REQUEST_TIMEOUT_SECS", timeout);
            assert!(Settings::from_env().is_err(), "{timeout}");
        }
        env::remove_var("REQUEST_TIMEOUT_SECS");

        assert!(Settings::from_env().is_ok());

        clear_env();
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let jwt = JwtSettings {
            access_secret: "super-secret-access-value-000000000".into(),
            refresh_secret: "super-secret-refresh-value-00000000".into(),
            audience: "user".into(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 3600,
        };
        let rendered = format!("{:?}", jwt);
        assert!(!rendered.contains("super-secret"));
    }
}
