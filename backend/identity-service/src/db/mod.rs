/// Storage adapters for identity service
///
/// Repositories are capability traits injected as `Arc<dyn ...>` so the
/// session manager never knows which backend it talks to:
///
/// - `memory`: process-local adapters backed by `DashMap` (tests, single-node dev)
/// - `users` / `sessions` / `verification_codes`: PostgreSQL adapters via `sqlx`
use crate::error::Result;
use crate::models::{NewSession, NewUser, NewVerificationCode, Session, User, VerificationCode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub mod memory;
pub mod sessions;
pub mod users;
pub mod verification_codes;

pub use memory::{
    InMemorySessionRepository, InMemoryUserRepository, InMemoryVerificationCodeRepository,
};
pub use sessions::PgSessionRepository;
pub use users::PgUserRepository;
pub use verification_codes::PgVerificationCodeRepository;

/// Outcome of a compare-and-swap on a session's expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryUpdate {
    /// Stored expiry matched `expected` and was replaced
    Applied,
    /// Record exists but its expiry no longer matches `expected`
    Stale,
    /// No record with that id
    Missing,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. A taken email fails with `DuplicateEmail`.
    async fn create(&self, new_user: NewUser) -> Result<User>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, new_session: NewSession) -> Result<Session>;

    /// Raw read by id, including records whose expiry has passed.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>>;

    /// Read by id, treating `expires_at <= now` as absent.
    async fn find_live(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Session>> {
        Ok(self
            .find_by_id(id)
            .await?
            .filter(|session| !session.is_expired_at(now)))
    }

    /// Replace `expires_at` only if it still equals `expected`.
    async fn extend_expiry(
        &self,
        id: Uuid,
        expected: DateTime<Utc>,
        new_expiry: DateTime<Utc>,
    ) -> Result<ExpiryUpdate>;

    /// Delete a session. Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait VerificationCodeRepository: Send + Sync {
    async fn create(&self, new_code: NewVerificationCode) -> Result<VerificationCode>;
}

/// The set of adapters a session manager is built from
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub verification_codes: Arc<dyn VerificationCodeRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            sessions: Arc::new(InMemorySessionRepository::new()),
            verification_codes: Arc::new(InMemoryVerificationCodeRepository::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool.clone())),
            verification_codes: Arc::new(PgVerificationCodeRepository::new(pool)),
        }
    }
}
