/// Authentication handlers
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use super::cookies::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use super::AppState;
use crate::error::IdentityError;
use crate::services::{LoginInput, RegisterInput, RequestContext};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn user_agent(req: &HttpRequest) -> String {
    req.headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn cookie_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.cookie(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

fn request_context(state: &AppState) -> RequestContext {
    RequestContext::with_timeout(state.request_timeout)
}

/// POST /register
pub async fn register(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, IdentityError> {
    let payload = payload.into_inner();
    let input = RegisterInput {
        email: payload.email,
        password: payload.password,
        user_agent: user_agent(&req),
        first_name: payload.first_name,
        last_name: payload.last_name,
    };

    let output = state.auth.register(&request_context(&state), input).await?;

    Ok(HttpResponse::Ok()
        .cookie(state.cookies.access(output.tokens.access_token))
        .cookie(state.cookies.refresh(output.tokens.refresh_token))
        .json(output.user))
}

/// POST /login
pub async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, IdentityError> {
    let payload = payload.into_inner();
    let input = LoginInput {
        email: payload.email,
        password: payload.password,
        user_agent: user_agent(&req),
    };

    let tokens = state.auth.login(&request_context(&state), input).await?;

    Ok(HttpResponse::Ok()
        .cookie(state.cookies.access(tokens.access_token))
        .cookie(state.cookies.refresh(tokens.refresh_token))
        .json(MessageResponse {
            message: "Login successful",
        }))
}

/// GET /logout (reads the access token cookie)
pub async fn logout(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, IdentityError> {
    let access_token =
        cookie_value(&req, ACCESS_TOKEN_COOKIE).ok_or(IdentityError::Unauthorized)?;

    state
        .auth
        .logout(&request_context(&state), &access_token)
        .await?;

    Ok(HttpResponse::Ok()
        .cookie(state.cookies.clear_access())
        .cookie(state.cookies.clear_refresh())
        .json(MessageResponse {
            message: "Logout successful",
        }))
}

/// GET /refresh (reads the refresh token cookie)
///
/// Always sets a new access cookie. The refresh cookie is only rewritten
/// when the session was rotated.
pub async fn refresh(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, IdentityError> {
    let refresh_token =
        cookie_value(&req, REFRESH_TOKEN_COOKIE).ok_or(IdentityError::Unauthorized)?;

    let output = state
        .auth
        .refresh(&request_context(&state), &refresh_token)
        .await?;

    let mut response = HttpResponse::Ok();
    response.cookie(state.cookies.access(output.access_token));
    if let Some(rotated) = output.refresh_token {
        response.cookie(state.cookies.refresh(rotated));
    }

    Ok(response.json(MessageResponse {
        message: "Access token refreshed",
    }))
}

/// GET /validate-token (reads the access token cookie)
pub async fn validate_token(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, IdentityError> {
    let access_token =
        cookie_value(&req, ACCESS_TOKEN_COOKIE).ok_or(IdentityError::Unauthorized)?;

    let identity = state
        .auth
        .validate_access_token(&request_context(&state), &access_token)
        .await?;

    Ok(HttpResponse::Ok().json(identity))
}

/// GET /health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}
