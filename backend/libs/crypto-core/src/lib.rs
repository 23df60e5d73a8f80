//! Shared cryptographic primitives for Storefront services
//!
//! - `jwt`: typed access/refresh token codec (HS256, per-kind secrets)
//! - `correlation`: correlation-id propagation helpers

pub mod correlation;
pub mod jwt;

pub use jwt::{AccessClaims, JwtError, JwtSecret, RefreshClaims, TokenCodec, TokenCodecConfig};
