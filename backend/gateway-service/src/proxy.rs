//! Upstream forwarding for routed requests

use crate::error::{GatewayError, Result};
use crate::identity_client::ValidatedUser;
use crate::middleware::CorrelationId;
use crate::policy::RoutePolicy;
use actix_web::{http::StatusCode, web, HttpMessage, HttpRequest, HttpResponse};
use crypto_core::correlation::{correlation_id_or_new, HTTP_CORRELATION_ID_HEADER};
use reqwest::header::{HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Headers that describe a single hop or that only the gateway may set
const SKIPPED_REQUEST_HEADERS: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
    "content-length",
    HTTP_CORRELATION_ID_HEADER,
    USER_ID_HEADER,
    USER_ROLE_HEADER,
];

const SKIPPED_RESPONSE_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "transfer-encoding",
    "content-length",
];

pub struct Proxy {
    policy: Arc<RoutePolicy>,
    client: reqwest::Client,
}

impl Proxy {
    pub fn new(policy: Arc<RoutePolicy>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::BadGateway(e.to_string()))?;
        Ok(Self { policy, client })
    }
}

/// Default service: forward to the upstream owning the path prefix
pub async fn forward(
    req: HttpRequest,
    body: web::Bytes,
    proxy: web::Data<Proxy>,
) -> Result<HttpResponse> {
    let route = proxy
        .policy
        .match_route(req.path())
        .ok_or(GatewayError::RouteNotFound)?;

    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.path());
    let url = route.upstream_url(path_and_query);

    let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
        .map_err(|e| GatewayError::BadGateway(e.to_string()))?;

    let mut upstream = proxy.client.request(method, &url);

    for (name, value) in req.headers() {
        if SKIPPED_REQUEST_HEADERS.contains(&name.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            upstream = upstream.header(name, value);
        }
    }

    {
        let extensions = req.extensions();
        if let Some(user) = extensions.get::<ValidatedUser>() {
            upstream = upstream
                .header(USER_ID_HEADER, user.user_id.as_str())
                .header(USER_ROLE_HEADER, user.role.as_str());
        }
        let correlation_id = match extensions.get::<CorrelationId>() {
            Some(CorrelationId(id)) => id.clone(),
            None => correlation_id_or_new(
                req.headers()
                    .get(HTTP_CORRELATION_ID_HEADER)
                    .and_then(|value| value.to_str().ok()),
            ),
        };
        upstream = upstream.header(HTTP_CORRELATION_ID_HEADER, correlation_id);
    }

    let response = upstream
        .body(body)
        .send()
        .await
        .map_err(|e| GatewayError::BadGateway(format!("{url}: {e}")))?;

    let status = StatusCode::from_u16(response.status().as_u16())
        .map_err(|e| GatewayError::BadGateway(e.to_string()))?;
    let mut builder = HttpResponse::build(status);
    for (name, value) in response.headers() {
        if SKIPPED_RESPONSE_HEADERS.contains(&name.as_str()) {
            continue;
        }
        builder.append_header((name.as_str(), value.as_bytes()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| GatewayError::BadGateway(format!("{url}: {e}")))?;

    Ok(builder.body(bytes))
}
