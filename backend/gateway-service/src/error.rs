use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Gateway failures as seen by the client
///
/// Every failure to reach or understand the identity service is reported as
/// `401`; the gateway never lets a request through on an inconclusive check.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unauthorized: missing token")]
    MissingToken,

    #[error("Unauthorized: invalid token")]
    Unauthorized,

    #[error("Identity service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Forbidden: insufficient permissions")]
    Forbidden,

    #[error("Route not found")]
    RouteNotFound,

    #[error("Bad gateway: {0}")]
    BadGateway(String),
}

impl GatewayError {
    /// Message returned to the client; network detail stays in the logs
    fn public_message(&self) -> String {
        match self {
            GatewayError::UpstreamUnavailable(_) => GatewayError::Unauthorized.to_string(),
            GatewayError::BadGateway(_) => "Bad gateway".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MissingToken
            | GatewayError::Unauthorized
            | GatewayError::UpstreamUnavailable(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden => StatusCode::FORBIDDEN,
            GatewayError::RouteNotFound => StatusCode::NOT_FOUND,
            GatewayError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match self {
            GatewayError::UpstreamUnavailable(detail) => {
                tracing::warn!(error = %detail, "Token validation failed closed");
            }
            GatewayError::BadGateway(detail) => {
                tracing::error!(error = %detail, "Upstream request failed");
            }
            _ => {}
        }

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.public_message(),
            "status": status.as_u16(),
        }))
    }
}
