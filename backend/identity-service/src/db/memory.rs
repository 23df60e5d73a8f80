/// Process-local repositories backed by `DashMap`
///
/// Every operation locks a single shard entry, so the session
/// compare-and-swap is atomic per id without a global lock.
use super::{ExpiryUpdate, SessionRepository, UserRepository, VerificationCodeRepository};
use crate::error::{IdentityError, Result};
use crate::models::{NewSession, NewUser, NewVerificationCode, Session, User, VerificationCode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: DashMap<Uuid, User>,
    ids_by_email: DashMap<String, Uuid>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        match self.ids_by_email.entry(new_user.email.clone()) {
            Entry::Occupied(_) => Err(IdentityError::DuplicateEmail),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let user = User {
                    id: Uuid::new_v4(),
                    role: new_user.role_or_default().to_string(),
                    email: new_user.email,
                    password_hash: new_user.password_hash,
                    verified: false,
                    first_name: new_user.first_name,
                    last_name: new_user.last_name,
                    created_at: now,
                    updated_at: now,
                };

                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let id = match self.ids_by_email.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|user| user.clone()))
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: DashMap<Uuid, Session>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, new_session: NewSession) -> Result<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            user_id: new_session.user_id,
            user_agent: new_session.user_agent,
            expires_at: new_session.expires_at,
            created_at: Utc::now(),
        };

        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>> {
        Ok(self.sessions.get(&id).map(|session| session.clone()))
    }

    async fn extend_expiry(
        &self,
        id: Uuid,
        expected: DateTime<Utc>,
        new_expiry: DateTime<Utc>,
    ) -> Result<ExpiryUpdate> {
        let Some(mut session) = self.sessions.get_mut(&id) else {
            return Ok(ExpiryUpdate::Missing);
        };

        if session.expires_at != expected {
            return Ok(ExpiryUpdate::Stale);
        }

        session.expires_at = new_expiry;
        Ok(ExpiryUpdate::Applied)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.sessions.remove(&id).is_some())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryVerificationCodeRepository {
    codes: DashMap<Uuid, VerificationCode>,
}

impl InMemoryVerificationCodeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn codes_for(&self, user_id: Uuid) -> Vec<VerificationCode> {
        self.codes
            .iter()
            .filter(|code| code.user_id == user_id)
            .map(|code| code.clone())
            .collect()
    }
}

#[async_trait]
impl VerificationCodeRepository for InMemoryVerificationCodeRepository {
    async fn create(&self, new_code: NewVerificationCode) -> Result<VerificationCode> {
        let code = VerificationCode {
            id: Uuid::new_v4(),
            user_id: new_code.user_id,
            code_type: new_code.code_type,
            expires_at: new_code.expires_at,
            created_at: Utc::now(),
        };

        self.codes.insert(code.id, code.clone());
        Ok(code)
    }
}
