use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Purpose of a verification code, matching database `verification_code_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "verification_code_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationCodeType {
    EmailVerification,
    PasswordReset,
}

impl VerificationCodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationCodeType::EmailVerification => "email_verification",
            VerificationCodeType::PasswordReset => "password_reset",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VerificationCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code_type: VerificationCodeType,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVerificationCode {
    pub user_id: Uuid,
    pub code_type: VerificationCodeType,
    pub expires_at: DateTime<Utc>,
}
