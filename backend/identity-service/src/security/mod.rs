/// Security primitives for identity-service
///
/// - **password**: Argon2id password hashing
/// - **crypto-core::jwt**: shared typed token codec (HS256, per-kind secrets)
pub use crypto_core::jwt::{AccessClaims, RefreshClaims, TokenCodec, TokenCodecConfig};

pub mod password;

pub use password::{hash_password, verify_password};
