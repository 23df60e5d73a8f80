/// Logging decorator for any `AuthService`
///
/// Forwards every call unchanged and emits one event per call with the
/// operation name, elapsed time and outcome. Token strings and passwords
/// never reach the log.
use crate::error::Result;
use crate::services::auth::{
    AuthService, LoginInput, RefreshOutput, RegisterInput, RegisterOutput, TokenPair,
    ValidatedIdentity,
};
use crate::services::context::RequestContext;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{info, warn};

pub struct LoggingAuthService<S> {
    inner: S,
}

impl<S: AuthService> LoggingAuthService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

fn record<T>(
    operation: &'static str,
    started: Instant,
    result: &Result<T>,
    summary: impl FnOnce(&T) -> String,
) {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(value) => info!(
            operation,
            elapsed_ms,
            result = %summary(value),
            "auth operation completed"
        ),
        Err(error) => warn!(
            operation,
            elapsed_ms,
            error = %error,
            "auth operation failed"
        ),
    }
}

#[async_trait]
impl<S: AuthService> AuthService for LoggingAuthService<S> {
    async fn register(&self, ctx: &RequestContext, input: RegisterInput) -> Result<RegisterOutput> {
        let started = Instant::now();
        let result = self.inner.register(ctx, input).await;
        record("register", started, &result, |out| format!("user_id={}", out.user.id));
        result
    }

    async fn login(&self, ctx: &RequestContext, input: LoginInput) -> Result<TokenPair> {
        let started = Instant::now();
        let result = self.inner.login(ctx, input).await;
        record("login", started, &result, |_| "tokens issued".to_string());
        result
    }

    async fn logout(&self, ctx: &RequestContext, access_token: &str) -> Result<()> {
        let started = Instant::now();
        let result = self.inner.logout(ctx, access_token).await;
        record("logout", started, &result, |_| "session revoked".to_string());
        result
    }

    async fn refresh(&self, ctx: &RequestContext, refresh_token: &str) -> Result<RefreshOutput> {
        let started = Instant::now();
        let result = self.inner.refresh(ctx, refresh_token).await;
        record("refresh", started, &result, |out| format!("rotated={}", out.rotated()));
        result
    }

    async fn validate_access_token(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<ValidatedIdentity> {
        let started = Instant::now();
        let result = self.inner.validate_access_token(ctx, access_token).await;
        record("validate_access_token", started, &result, |identity| {
            format!("user_id={} role={}", identity.user_id, identity.role)
        });
        result
    }
}
