/// Identity Service Library
///
/// Issues, rotates and revokes the credentials of the storefront session
/// lifecycle.
///
/// ## Modules
///
/// - `config`: Service configuration
/// - `db`: Repository traits with in-memory and PostgreSQL adapters
/// - `error`: Error taxonomy and HTTP mapping
/// - `http`: Cookie-based HTTP API
/// - `models`: Data models
/// - `security`: Password hashing, token codec re-exports
/// - `services`: Session lifecycle manager and logging decorator
/// - `validators`: Input validation
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod security;
pub mod services;
pub mod validators;

// Re-export commonly used types
pub use error::{IdentityError, Result, ValidationError};
pub use services::{AuthService, LoggingAuthService, RequestContext, SessionManager, SessionPolicy};
