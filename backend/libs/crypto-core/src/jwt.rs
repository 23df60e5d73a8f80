//! Shared JWT module for Storefront services
//!
//! Issues and verifies the two credential kinds of the session lifecycle:
//!
//! - **Access tokens** (`AccessClaims`): bind an identity to a session, short TTL
//! - **Refresh tokens** (`RefreshClaims`): name a session only, long TTL
//!
//! ## Security Design
//!
//! - **HS256 only**: tokens carrying any other `alg` are rejected
//! - **Per-kind secrets**: access and refresh tokens are signed with different
//!   secrets, so a leaked refresh secret cannot mint access tokens
//! - **Disjoint claim shapes**: both claim structs deny unknown fields, so an
//!   access token never decodes as a refresh token (and vice versa) even when
//!   the signature checks out
//! - **No globals**: keys live in a `TokenCodec` built once at startup and
//!   shared by reference
//!
//! ## Usage
//!
//! ```rust
//! use crypto_core::jwt::{TokenCodec, TokenCodecConfig};
//! use uuid::Uuid;
//!
//! let codec = TokenCodec::new(TokenCodecConfig {
//!     access_secret: "a".repeat(32),
//!     refresh_secret: "r".repeat(32),
//!     audience: "user".to_string(),
//!     access_ttl_secs: 900,
//!     refresh_ttl_secs: 30 * 24 * 3600,
//! })
//! .expect("valid codec config");
//!
//! let session_id = Uuid::new_v4();
//! let refresh = codec.issue_refresh(session_id).unwrap();
//! assert_eq!(codec.verify_refresh(&refresh).unwrap().session_id, session_id);
//! ```
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Minimum HMAC secret length accepted by `JwtSecret::new`
pub const MIN_SECRET_BYTES: usize = 32;

/// Upper bound for either token lifetime (ten years)
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 3600;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JwtError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("unexpected token algorithm")]
    InvalidAlgorithm,

    #[error("token expired")]
    Expired,

    #[error("invalid token audience")]
    InvalidAudience,

    #[error("invalid token claims: {0}")]
    InvalidClaims(String),

    #[error("secret must be at least {MIN_SECRET_BYTES} bytes")]
    WeakSecret,

    #[error("access and refresh secrets must differ")]
    ReusedSecret,

    #[error("token lifetime must be between 1 and {MAX_TTL_SECS} seconds")]
    InvalidTtl,

    #[error("failed to encode token: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                JwtError::InvalidAlgorithm
            }
            ErrorKind::InvalidAudience => JwtError::InvalidAudience,
            ErrorKind::MissingRequiredClaim(claim) => {
                JwtError::InvalidClaims(format!("missing claim `{claim}`"))
            }
            ErrorKind::Json(e) => JwtError::InvalidClaims(e.to_string()),
            _ => JwtError::Malformed,
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessClaims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// HMAC signing material for one token kind
#[derive(Clone)]
pub struct JwtSecret {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtSecret {
    pub fn new(secret: &str) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(JwtError::WeakSecret);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JwtSecret(<redacted>)")
    }
}

// ============================================================================
// Low-level sign / verify
// ============================================================================

/// Sign any claim shape with the given secret
pub fn sign<C: Serialize>(claims: &C, secret: &JwtSecret) -> Result<String, JwtError> {
    encode(&Header::new(JWT_ALGORITHM), claims, &secret.encoding)
        .map_err(|e| JwtError::Encoding(e.to_string()))
}

/// Verify signature, algorithm, expiry and audience, then decode into `C`
///
/// The claim shape is part of the check: a token whose payload does not
/// deserialize into `C` is rejected with `InvalidClaims`.
pub fn verify<C: DeserializeOwned>(
    token: &str,
    secret: &JwtSecret,
    audience: &str,
) -> Result<C, JwtError> {
    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_audience(&[audience]);
    validation.set_required_spec_claims(&["exp", "aud"]);

    let data = decode::<C>(token, &secret.decoding, &validation)?;
    Ok(data.claims)
}

// ============================================================================
// Token Codec
// ============================================================================

/// Raw settings for building a `TokenCodec`
#[derive(Debug, Clone)]
pub struct TokenCodecConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub audience: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

/// Issues and verifies access/refresh tokens
///
/// Built once at startup; immutable and cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    access_secret: JwtSecret,
    refresh_secret: JwtSecret,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: TokenCodecConfig) -> Result<Self, JwtError> {
        if config.access_secret == config.refresh_secret {
            return Err(JwtError::ReusedSecret);
        }
        for ttl in [config.access_ttl_secs, config.refresh_ttl_secs] {
            if !(1..=MAX_TTL_SECS).contains(&ttl) {
                return Err(JwtError::InvalidTtl);
            }
        }

        Ok(Self {
            access_secret: JwtSecret::new(&config.access_secret)?,
            refresh_secret: JwtSecret::new(&config.refresh_secret)?,
            audience: config.audience,
            access_ttl: Duration::seconds(config.access_ttl_secs),
            refresh_ttl: Duration::seconds(config.refresh_ttl_secs),
        })
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue an access token bound to `(user_id, session_id)`
    pub fn issue_access(&self, user_id: Uuid, session_id: Uuid) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = AccessClaims {
            user_id,
            session_id,
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        sign(&claims, &self.access_secret)
    }

    /// Issue a refresh token bound to `session_id`
    pub fn issue_refresh(&self, session_id: Uuid) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            session_id,
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };
        sign(&claims, &self.refresh_secret)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, JwtError> {
        verify(token, &self.access_secret, &self.audience)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        verify(token, &self.refresh_secret, &self.audience)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS_SECRET: &str = "access-secret-for-tests-0123456789abcdef";
    const REFRESH_SECRET: &str = "refresh-secret-for-tests-0123456789abcdef";

    fn codec() -> TokenCodec {
        TokenCodec::new(TokenCodecConfig {
            access_secret: ACCESS_SECRET.to_string(),
            refresh_secret: REFRESH_SECRET.to_string(),
            audience: "user".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 30 * 24 * 3600,
        })
        .expect("test codec")
    }

    #[test]
    fn test_access_token_round_trip() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();

        let token = codec.issue_access(user_id, session_id).unwrap();
        assert_eq!(token.matches('.').count(), 2);

        let claims = codec.verify_access(&token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.session_id, session_id);
        assert_eq!(claims.aud, "user");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_outlives_access() {
        let codec = codec();
        let session_id = Uuid::new_v4();

        let access = codec.issue_access(Uuid::new_v4(), session_id).unwrap();
        let refresh = codec.issue_refresh(session_id).unwrap();

        let access_claims = codec.verify_access(&access).unwrap();
        let refresh_claims = codec.verify_refresh(&refresh).unwrap();
        assert!(refresh_claims.exp > access_claims.exp);
    }

    #[test]
    fn test_rejects_malformed_token() {
        let codec = codec();
        assert!(codec.verify_access("invalid.token.here").is_err());
        assert_eq!(codec.verify_access("not-a-jwt"), Err(JwtError::Malformed));
    }

    #[test]
    fn test_rejects_tampered_token() {
        let codec = codec();
        let token = codec.issue_access(Uuid::new_v4(), Uuid::new_v4()).unwrap();

        let (head, signature) = token.rsplit_once('.').unwrap();
        let flipped = if signature.starts_with('A') { "B" } else { "A" };
        let tampered = format!("{head}.{flipped}{}", &signature[1..]);

        assert!(codec.verify_access(&tampered).is_err());
    }

    #[test]
    fn test_refresh_secret_cannot_mint_access_tokens() {
        let codec = codec();
        let refresh_secret = JwtSecret::new(REFRESH_SECRET).unwrap();
        let now = Utc::now().timestamp();

        let forged = sign(
            &AccessClaims {
                user_id: Uuid::new_v4(),
                session_id: Uuid::new_v4(),
                aud: "user".to_string(),
                iat: now,
                exp: now + 900,
            },
            &refresh_secret,
        )
        .unwrap();

        assert_eq!(codec.verify_access(&forged), Err(JwtError::InvalidSignature));
    }

    #[test]
    fn test_claim_shapes_are_disjoint() {
        let secret = JwtSecret::new(ACCESS_SECRET).unwrap();
        let now = Utc::now().timestamp();

        let access = sign(
            &AccessClaims {
                user_id: Uuid::new_v4(),
                session_id: Uuid::new_v4(),
                aud: "user".to_string(),
                iat: now,
                exp: now + 900,
            },
            &secret,
        )
        .unwrap();
        let refresh = sign(
            &RefreshClaims {
                session_id: Uuid::new_v4(),
                aud: "user".to_string(),
                iat: now,
                exp: now + 900,
            },
            &secret,
        )
        .unwrap();

        // Same secret, valid signatures: only the shape differs
        assert!(matches!(
            verify::<RefreshClaims>(&access, &secret, "user"),
            Err(JwtError::InvalidClaims(_))
        ));
        assert!(matches!(
            verify::<AccessClaims>(&refresh, &secret, "user"),
            Err(JwtError::InvalidClaims(_))
        ));
    }

    #[test]
    fn test_rejects_expired_token() {
        let secret = JwtSecret::new(ACCESS_SECRET).unwrap();
        let now = Utc::now().timestamp();

        let expired = sign(
            &RefreshClaims {
                session_id: Uuid::new_v4(),
                aud: "user".to_string(),
                iat: now - 7200,
                exp: now - 3600,
            },
            &secret,
        )
        .unwrap();

        assert_eq!(
            verify::<RefreshClaims>(&expired, &secret, "user"),
            Err(JwtError::Expired)
        );
    }

    #[test]
    fn test_rejects_wrong_audience() {
        let secret = JwtSecret::new(ACCESS_SECRET).unwrap();
        let now = Utc::now().timestamp();

        let token = sign(
            &RefreshClaims {
                session_id: Uuid::new_v4(),
                aud: "admin-console".to_string(),
                iat: now,
                exp: now + 60,
            },
            &secret,
        )
        .unwrap();

        assert_eq!(
            verify::<RefreshClaims>(&token, &secret, "user"),
            Err(JwtError::InvalidAudience)
        );
    }

    #[test]
    fn test_rejects_other_algorithm_family() {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            session_id: Uuid::new_v4(),
            aud: "user".to_string(),
            iat: now,
            exp: now + 60,
        };

        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(ACCESS_SECRET.as_bytes()),
        )
        .unwrap();

        let secret = JwtSecret::new(ACCESS_SECRET).unwrap();
        assert_eq!(
            verify::<RefreshClaims>(&hs512, &secret, "user"),
            Err(JwtError::InvalidAlgorithm)
        );
    }

    #[test]
    fn test_rejects_unsigned_token() {
        let codec = codec();
        // {"alg":"none","typ":"JWT"} . {"sessionId":...} . <empty>
        let header = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";
        let body = "eyJzZXNzaW9uSWQiOiIwMDAwMDAwMC0wMDAwLTAwMDAtMDAwMC0wMDAwMDAwMDAwMDAiLCJhdWQiOiJ1c2VyIiwiaWF0IjowLCJleHAiOjQxMDI0NDQ4MDB9";
        let token = format!("{header}.{body}.");

        assert!(codec.verify_refresh(&token).is_err());
    }

    #[test]
    fn test_secret_requirements() {
        assert!(matches!(JwtSecret::new("short"), Err(JwtError::WeakSecret)));
        assert!(JwtSecret::new(&"a".repeat(MIN_SECRET_BYTES)).is_ok());

        let reused = TokenCodec::new(TokenCodecConfig {
            access_secret: ACCESS_SECRET.to_string(),
            refresh_secret: ACCESS_SECRET.to_string(),
            audience: "user".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 3600,
        });
        assert!(matches!(reused, Err(JwtError::ReusedSecret)));
    }

    #[test]
    fn test_ttl_bounds() {
        let with_ttls = |access_ttl_secs, refresh_ttl_secs| {
            TokenCodec::new(TokenCodecConfig {
                access_secret: ACCESS_SECRET.to_string(),
                refresh_secret: REFRESH_SECRET.to_string(),
                audience: "user".to_string(),
                access_ttl_secs,
                refresh_ttl_secs,
            })
        };

        assert!(with_ttls(900, MAX_TTL_SECS).is_ok());
        assert!(matches!(with_ttls(0, 3600), Err(JwtError::InvalidTtl)));
        assert!(matches!(with_ttls(900, -1), Err(JwtError::InvalidTtl)));
        assert!(matches!(
            with_ttls(900, 1_000_000_000_000_000),
            Err(JwtError::InvalidTtl)
        ));
    }

    #[test]
    fn test_claims_use_camel_case_wire_names() {
        let claims = AccessClaims {
            user_id: Uuid::nil(),
            session_id: Uuid::nil(),
            aud: "user".to_string(),
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("sessionId").is_some());
    }
}
