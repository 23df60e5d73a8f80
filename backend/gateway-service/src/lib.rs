//! Edge gateway
//!
//! Routes requests by path prefix to upstream services and enforces the
//! per-method role table by asking the identity service to validate the
//! caller's access token cookie.

pub mod config;
pub mod error;
pub mod identity_client;
pub mod middleware;
pub mod policy;
pub mod proxy;

pub use error::{GatewayError, Result};
pub use identity_client::{HttpIdentityClient, TokenValidator, ValidatedUser};
pub use middleware::RoleAuthorization;
pub use policy::{RoutePolicy, RouteRule};
pub use proxy::Proxy;

use actix_web::{web, HttpResponse};

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// Health check plus catch-all forwarding
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .default_service(web::to(proxy::forward));
}
