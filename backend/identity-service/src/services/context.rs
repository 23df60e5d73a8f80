/// Per-request deadline carried into every manager operation
use crate::error::{IdentityError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
}

impl RequestContext {
    /// No deadline; the operation runs until it completes or is dropped
    pub fn background() -> Self {
        Self::default()
    }

    /// A timeout too large to represent as an instant means no deadline
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    /// Fail fast if the deadline has already passed
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(IdentityError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Race a fallible operation against the deadline.
    ///
    /// On expiry the inner future is dropped, abandoning any in-flight
    /// storage round trip, and `Cancelled` is returned.
    pub async fn run<F, T>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.deadline {
            None => operation.await,
            Some(deadline) => timeout_at(deadline, operation)
                .await
                .map_err(|_| IdentityError::Cancelled)?,
        }
    }
}
