//! Per-query deadlines.

use std::time::{Duration, Instant};

use crate::domain::RouteError;

/// Point in time after which a query gives up with [`RouteError::Timeout`].
///
/// `None` never expires.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline `timeout` from now. A zero timeout is already expired; one
    /// too large to represent never expires.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(timeout),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.at
            .map_or(Duration::MAX, |at| at.saturating_duration_since(Instant::now()))
    }

    pub fn check(&self) -> Result<(), RouteError> {
        if self.is_expired() {
            Err(RouteError::Timeout)
        } else {
            Ok(())
        }
    }
}
