/// HTTP API for the session lifecycle
///
/// | Method | Path              | Success                                    |
/// |--------|-------------------|--------------------------------------------|
/// | POST   | `/register`       | user view, sets both cookies               |
/// | POST   | `/login`          | message, sets both cookies                 |
/// | GET    | `/logout`         | message, clears both cookies               |
/// | GET    | `/refresh`        | message, new access cookie, refresh cookie on rotation |
/// | GET    | `/validate-token` | `{user_id, role}`                          |
/// | GET    | `/health`         | `OK`                                       |
///
/// All paths are mounted under the configured API prefix.
pub mod cookies;
pub mod handlers;

pub use cookies::{CookieSettings, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

use crate::services::AuthService;
use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};
use std::sync::Arc;
use std::time::Duration;

/// Shared HTTP server state
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthService>,
    pub cookies: CookieSettings,
    pub request_timeout: Duration,
}

/// Malformed JSON bodies get the same error envelope as every other failure
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        let response = HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Invalid JSON body",
            "status": 400,
        }));
        actix_web::error::InternalError::from_response(err, response).into()
    })
}

/// Mount the API under `prefix`
pub fn configure(cfg: &mut web::ServiceConfig, prefix: &str) {
    cfg.app_data(json_config()).service(
        web::scope(prefix)
            .route("/register", web::post().to(handlers::register))
            .route("/login", web::post().to(handlers::login))
            .route("/logout", web::get().to(handlers::logout))
            .route("/refresh", web::get().to(handlers::refresh))
            .route("/validate-token", web::get().to(handlers::validate_token))
            .route("/health", web::get().to(handlers::health)),
    );
}
