/// Verification code database operations
use super::VerificationCodeRepository;
use crate::error::Result;
use crate::models::{NewVerificationCode, VerificationCode};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgVerificationCodeRepository {
    pool: PgPool,
}

impl PgVerificationCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationCodeRepository for PgVerificationCodeRepository {
    async fn create(&self, new_code: NewVerificationCode) -> Result<VerificationCode> {
        let code = sqlx::query_as::<_, VerificationCode>(
            r#"
            INSERT INTO verification_codes (id, user_id, code_type, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, code_type, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_code.user_id)
        .bind(new_code.code_type)
        .bind(new_code.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(code)
    }
}
