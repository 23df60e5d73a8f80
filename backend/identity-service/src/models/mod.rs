/// Data models for identities, sessions and verification codes
pub mod session;
pub mod user;
pub mod verification_code;

pub use session::{NewSession, Session};
pub use user::{NewUser, User, UserView, DEFAULT_ROLE};
pub use verification_code::{NewVerificationCode, VerificationCode, VerificationCodeType};
