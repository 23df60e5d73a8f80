//! Configuration for the gateway
//!
//! Read once at startup from environment variables (plus `.env` in debug
//! builds). The route table comes from `GATEWAY_ROUTES_FILE` when set,
//! otherwise from the built-in table over the configured service URLs.

use crate::policy::{RoutePolicy, RouteRule};
use actix_web::http::Method;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub upstream_timeout_secs: u64,
    pub routes: RoutePolicy,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// How the gateway reaches the identity service
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub service_url: String,
    pub validate_path: String,
    pub timeout_ms: u64,
    pub cookie_name: String,
}

impl AuthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) && dotenvy::dotenv().is_ok() {
            info!("Loaded .env file for development");
        }

        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        let auth = AuthConfig {
            service_url: env::var("AUTH_SERVICE_URL").context("AUTH_SERVICE_URL must be set")?,
            validate_path: env_or("AUTH_VALIDATE_PATH", "/auth/api/v1/validate-token"),
            timeout_ms: parse_env("AUTH_TIMEOUT_MS", 3000)?,
            cookie_name: env_or("ACCESS_TOKEN_COOKIE", "access_token"),
        };

        let routes = match env::var("GATEWAY_ROUTES_FILE") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read GATEWAY_ROUTES_FILE {path}"))?;
                RoutePolicy::from_json(&raw)
                    .with_context(|| format!("Invalid route table in {path}"))?
            }
            Err(_) => default_routes(&auth.service_url, env::var("PRODUCTS_SERVICE_URL").ok()),
        };

        Ok(Config {
            server: ServerConfig {
                host: env_or("SERVER_HOST", "0.0.0.0"),
                port: parse_env("SERVER_PORT", 8080)?,
            },
            auth,
            upstream_timeout_secs: parse_env("UPSTREAM_TIMEOUT_SECS", 30)?,
            routes,
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

/// `/auth/` is open; catalog writes need the `admin` role
fn default_routes(auth_url: &str, products_url: Option<String>) -> RoutePolicy {
    let mut routes = vec![RouteRule::new("/auth/", auth_url)];

    if let Some(products_url) = products_url {
        let mut products = RouteRule::new("/products/", products_url).strip("/products");
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            products = products.require(method, "admin");
        }
        routes.push(products);
    }

    RoutePolicy::new(routes)
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
