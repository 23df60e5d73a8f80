/// Session database operations
use super::{ExpiryUpdate, SessionRepository};
use crate::error::Result;
use crate::models::{NewSession, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, new_session: NewSession) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, user_agent, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, user_agent, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_session.user_id)
        .bind(&new_session.user_agent)
        .bind(new_session.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, user_agent, expires_at, created_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// `expected` must be a value read back from this table so the
    /// microsecond-precision comparison matches.
    async fn extend_expiry(
        &self,
        id: Uuid,
        expected: DateTime<Utc>,
        new_expiry: DateTime<Utc>,
    ) -> Result<ExpiryUpdate> {
        let updated = sqlx::query(
            r#"
            UPDATE sessions
            SET expires_at = $3
            WHERE id = $1 AND expires_at = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(new_expiry)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 1 {
            return Ok(ExpiryUpdate::Applied);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sessions WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(if exists {
            ExpiryUpdate::Stale
        } else {
            ExpiryUpdate::Missing
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(deleted.rows_affected() > 0)
    }
}
