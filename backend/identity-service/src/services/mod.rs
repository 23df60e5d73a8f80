/// Service layer for identity-service
///
/// - `auth`: session lifecycle manager and the `AuthService` capability
/// - `context`: per-request deadline propagation
/// - `logging`: transparent logging decorator over any `AuthService`
pub mod auth;
pub mod context;
pub mod logging;

pub use auth::{
    AuthService, LoginInput, RefreshOutput, RegisterInput, RegisterOutput, SessionManager,
    SessionPolicy, TokenPair, ValidatedIdentity,
};
pub use context::RequestContext;
pub use logging::LoggingAuthService;
