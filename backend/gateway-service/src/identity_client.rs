//! Client for the identity service's token validation endpoint

use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use crypto_core::correlation::HTTP_CORRELATION_ID_HEADER;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Identity attached to an authorized request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedUser {
    pub user_id: String,
    pub role: String,
}

/// Access token validation performed by another process
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, access_token: &str, correlation_id: &str) -> Result<ValidatedUser>;
}

/// Calls `GET <base><validate_path>` with the token as a cookie
pub struct HttpIdentityClient {
    client: Client,
    validate_url: String,
    cookie_name: String,
}

impl HttpIdentityClient {
    pub fn new(
        base_url: &str,
        validate_path: &str,
        timeout: Duration,
        cookie_name: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::UpstreamUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            validate_url: format!("{}{}", base_url.trim_end_matches('/'), validate_path),
            cookie_name: cookie_name.into(),
        })
    }

    pub fn validate_url(&self) -> &str {
        &self.validate_url
    }
}

#[async_trait]
impl TokenValidator for HttpIdentityClient {
    async fn validate(&self, access_token: &str, correlation_id: &str) -> Result<ValidatedUser> {
        let response = self
            .client
            .get(&self.validate_url)
            .header(header::COOKIE, format!("{}={}", self.cookie_name, access_token))
            .header(HTTP_CORRELATION_ID_HEADER, correlation_id)
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            return Err(GatewayError::UpstreamUnavailable(format!(
                "identity service answered {status}"
            )));
        }
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "Identity service rejected token");
            return Err(GatewayError::Unauthorized);
        }

        response
            .json::<ValidatedUser>()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("invalid validation body: {e}")))
    }
}
