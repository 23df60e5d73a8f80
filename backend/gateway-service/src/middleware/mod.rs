pub mod auth;

pub use auth::{CorrelationId, RoleAuthorization};
