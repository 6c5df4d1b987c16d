//! Deadlines for collaborator lookups.
//!
//! # Responsibilities
//! - Bound the time function resolution may spend in external collaborators
//! - Let the enclosing request cancel in-progress resolution
//!
//! # Design Decisions
//! - One deadline per evaluation, cloned into every rule context
//! - Expiry and cancellation are distinct errors
//! - Checked before every collaborator call; collaborators get the remaining budget

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a deadline no longer permits work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeadlineError {
    #[error("deadline exceeded")]
    Expired,
    #[error("evaluation cancelled")]
    Cancelled,
}

/// Expiry instant plus cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    expires_at: Option<Instant>,
    token: CancellationToken,
}

impl Deadline {
    /// No expiry, not cancelled.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn after(timeout: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(timeout),
            token: CancellationToken::new(),
        }
    }

    pub fn at(instant: Instant) -> Self {
        Self {
            expires_at: Some(instant),
            token: CancellationToken::new(),
        }
    }

    /// Tie this deadline to a request-scoped cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.token
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Time left, or `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn check(&self) -> Result<(), DeadlineError> {
        if self.token.is_cancelled() {
            return Err(DeadlineError::Cancelled);
        }
        match self.expires_at {
            Some(at) if Instant::now() >= at => Err(DeadlineError::Expired),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_deadline() {
        let deadline = Deadline::none();
        assert!(deadline.check().is_ok());
        assert!(deadline.remaining().is_none());
    }

    #[test]
    fn test_expired_deadline() {
        let deadline = Deadline::at(Instant::now());
        assert_eq!(deadline.check(), Err(DeadlineError::Expired));
        assert_eq!(deadline.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_cancellation_wins() {
        let token = CancellationToken::new();
        let deadline = Deadline::after(Duration::from_secs(60)).with_cancellation(token.clone());
        assert!(deadline.check().is_ok());
        token.cancel();
        assert_eq!(deadline.check(), Err(DeadlineError::Cancelled));
    }
}
