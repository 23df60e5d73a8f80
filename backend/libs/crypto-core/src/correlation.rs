//! Correlation ID utilities for cross-service tracing
//!
//! ```text
//! Client HTTP Request
//!   ↓ (x-correlation-id header, or generated at the gateway)
//! Gateway authorization middleware
//!   ↓ (same header on the validate-token call)
//! Identity service handler (recorded on the request span)
//! ```

use uuid::Uuid;

/// HTTP header for correlation ID
pub const HTTP_CORRELATION_ID_HEADER: &str = "x-correlation-id";

const MAX_CORRELATION_ID_LEN: usize = 128;

/// Reuse an inbound correlation id when it is sane, otherwise mint one
pub fn correlation_id_or_new(inbound: Option<&str>) -> String {
    match inbound.map(str::trim) {
        Some(id) if is_acceptable(id) => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

fn is_acceptable(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_CORRELATION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
