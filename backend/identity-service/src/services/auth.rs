/// Session lifecycle: register, login, logout, refresh and token validation
///
/// ## Sliding expiration
///
/// A session lives for the refresh TTL. A refresh call far from expiry only
/// mints a new access token and touches no storage. A refresh call within
/// `rotation_threshold` of expiry extends the session to `now + refresh TTL`
/// and issues a new refresh token.
///
/// The extension is a compare-and-swap on the expiry that was read, so two
/// concurrent rotations of one session cannot both win: the loser gets
/// `RotationConflict` and may retry.
///
/// ## Revocation
///
/// Logout deletes the session, which kills refresh immediately. Access
/// tokens already issued stay valid until their own short expiry unless
/// `validate_requires_session` is set.
use crate::db::{
    ExpiryUpdate, Repositories, SessionRepository, UserRepository, VerificationCodeRepository,
};
use crate::error::{IdentityError, Result};
use crate::models::{NewSession, NewUser, NewVerificationCode, User, UserView, VerificationCodeType};
use crate::security::{hash_password, verify_password, TokenCodec};
use crate::services::context::RequestContext;
use crate::validators::validate_credentials;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Lifetime of an email verification code
const VERIFICATION_CODE_TTL_DAYS: i64 = 365;

// ============================================================================
// Inputs / Outputs
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub user_agent: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub user_agent: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenPair(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct RegisterOutput {
    pub user: UserView,
    pub tokens: TokenPair,
}

#[derive(Clone, PartialEq, Eq)]
pub struct RefreshOutput {
    pub access_token: String,
    /// `None` means the caller keeps using its current refresh token
    pub refresh_token: Option<String>,
}

impl RefreshOutput {
    pub fn rotated(&self) -> bool {
        self.refresh_token.is_some()
    }
}

impl std::fmt::Debug for RefreshOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshOutput")
            .field("rotated", &self.rotated())
            .finish()
    }
}

/// Identity behind a valid access token, as consumed by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedIdentity {
    pub user_id: Uuid,
    pub role: String,
}

// ============================================================================
// Capability
// ============================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, ctx: &RequestContext, input: RegisterInput) -> Result<RegisterOutput>;

    async fn login(&self, ctx: &RequestContext, input: LoginInput) -> Result<TokenPair>;

    /// Idempotent: a session that is already gone is not an error
    async fn logout(&self, ctx: &RequestContext, access_token: &str) -> Result<()>;

    async fn refresh(&self, ctx: &RequestContext, refresh_token: &str) -> Result<RefreshOutput>;

    async fn validate_access_token(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<ValidatedIdentity>;
}

// ============================================================================
// Session Manager
// ============================================================================

/// Tunables of the session lifecycle that are not token-codec settings
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub rotation_threshold: Duration,
    pub validate_requires_session: bool,
    /// Base of the email verification URL
    pub app_origin: String,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            rotation_threshold: Duration::hours(1),
            validate_requires_session: false,
            app_origin: "http://localhost:3000".to_string(),
        }
    }
}

pub struct SessionManager {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    verification_codes: Arc<dyn VerificationCodeRepository>,
    codec: Arc<TokenCodec>,
    policy: SessionPolicy,
}

impl SessionManager {
    pub fn new(repositories: Repositories, codec: Arc<TokenCodec>, policy: SessionPolicy) -> Self {
        Self {
            users: repositories.users,
            sessions: repositories.sessions,
            verification_codes: repositories.verification_codes,
            codec,
            policy,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Session lifetime equals the refresh token lifetime
    fn session_ttl(&self) -> Duration {
        self.codec.refresh_ttl()
    }

    fn issue_pair(&self, user_id: Uuid, session_id: Uuid) -> Result<TokenPair> {
        let refresh_token = self.codec.issue_refresh(session_id)?;
        let access_token = self.codec.issue_access(user_id, session_id)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    async fn open_session(
        &self,
        ctx: &RequestContext,
        user: &User,
        user_agent: String,
    ) -> Result<TokenPair> {
        let session = ctx
            .run(self.sessions.create(NewSession {
                user_id: user.id,
                user_agent,
                expires_at: Utc::now() + self.session_ttl(),
            }))
            .await?;

        self.issue_pair(user.id, session.id)
    }

    /// Best effort: delivery is someone else's job and a failure here must
    /// not undo a registration.
    async fn issue_verification_code(&self, ctx: &RequestContext, user: &User) {
        let created = ctx
            .run(self.verification_codes.create(NewVerificationCode {
                user_id: user.id,
                code_type: VerificationCodeType::EmailVerification,
                expires_at: Utc::now() + Duration::days(VERIFICATION_CODE_TTL_DAYS),
            }))
            .await;

        match created {
            Ok(code) => info!(
                user_id = %user.id,
                verification_url = %format!("{}/email/verify/{}", self.policy.app_origin, code.id),
                "Email verification code issued"
            ),
            Err(e) => warn!(user_id = %user.id, error = %e, "Failed to issue verification code"),
        }
    }
}

async fn hash_off_thread(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| IdentityError::Internal(format!("Password hashing task failed: {}", e)))?
}

async fn verify_off_thread(password: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| IdentityError::Internal(format!("Password verification task failed: {}", e)))?
}

#[async_trait]
impl AuthService for SessionManager {
    async fn register(&self, ctx: &RequestContext, input: RegisterInput) -> Result<RegisterOutput> {
        validate_credentials(&input.email, &input.password)?;
        ctx.check()?;

        if ctx.run(self.users.find_by_email(&input.email)).await?.is_some() {
            return Err(IdentityError::DuplicateEmail);
        }

        let password_hash = ctx.run(hash_off_thread(input.password)).await?;

        // The store's unique index still guards the race between the
        // lookup above and this insert.
        let user = ctx
            .run(self.users.create(NewUser {
                email: input.email,
                password_hash,
                role: None,
                first_name: input.first_name,
                last_name: input.last_name,
            }))
            .await?;

        self.issue_verification_code(ctx, &user).await;

        // From here on a failure leaves the user in place without a session
        let tokens = self.open_session(ctx, &user, input.user_agent).await?;

        Ok(RegisterOutput {
            user: UserView::from(&user),
            tokens,
        })
    }

    async fn login(&self, ctx: &RequestContext, input: LoginInput) -> Result<TokenPair> {
        validate_credentials(&input.email, &input.password)?;
        ctx.check()?;

        let user = ctx
            .run(self.users.find_by_email(&input.email))
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        let matches = ctx
            .run(verify_off_thread(input.password, user.password_hash.clone()))
            .await?;
        if !matches {
            return Err(IdentityError::InvalidCredentials);
        }

        self.open_session(ctx, &user, input.user_agent).await
    }

    async fn logout(&self, ctx: &RequestContext, access_token: &str) -> Result<()> {
        let claims = self
            .codec
            .verify_access(access_token)
            .map_err(|_| IdentityError::Unauthorized)?;

        let removed = ctx.run(self.sessions.delete(claims.session_id)).await?;
        if !removed {
            info!(session_id = %claims.session_id, "Logout for a session that is already gone");
        }

        Ok(())
    }

    async fn refresh(&self, ctx: &RequestContext, refresh_token: &str) -> Result<RefreshOutput> {
        let claims = self
            .codec
            .verify_refresh(refresh_token)
            .map_err(|_| IdentityError::Unauthorized)?;

        let session = ctx
            .run(self.sessions.find_by_id(claims.session_id))
            .await?
            .ok_or(IdentityError::SessionNotFound)?;

        let now = Utc::now();
        if session.is_expired_at(now) {
            return Err(IdentityError::SessionExpired);
        }

        let mut rotated_refresh = None;
        if session.remaining_at(now) <= self.policy.rotation_threshold {
            let new_expiry = now + self.session_ttl();

            // Never shorten a session
            if new_expiry > session.expires_at {
                let update = ctx
                    .run(
                        self.sessions
                            .extend_expiry(session.id, session.expires_at, new_expiry),
                    )
                    .await?;

                match update {
                    ExpiryUpdate::Applied => {
                        rotated_refresh = Some(self.codec.issue_refresh(session.id)?);
                    }
                    ExpiryUpdate::Stale => return Err(IdentityError::RotationConflict),
                    ExpiryUpdate::Missing => return Err(IdentityError::SessionNotFound),
                }
            }
        }

        let access_token = self.codec.issue_access(session.user_id, session.id)?;

        Ok(RefreshOutput {
            access_token,
            refresh_token: rotated_refresh,
        })
    }

    async fn validate_access_token(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<ValidatedIdentity> {
        let claims = self
            .codec
            .verify_access(access_token)
            .map_err(|_| IdentityError::Unauthorized)?;

        if self.policy.validate_requires_session {
            ctx.run(self.sessions.find_live(claims.session_id, Utc::now()))
                .await?
                .ok_or(IdentityError::SessionNotFound)?;
        }

        let user = ctx
            .run(self.users.find_by_id(claims.user_id))
            .await?
            .ok_or(IdentityError::Unauthorized)?;

        Ok(ValidatedIdentity {
            user_id: user.id,
            role: user.role,
        })
    }
}
