//! Call-in-progress guard.
//!
//! Mutating operations run strictly one at a time; a nested call from
//! within an in-flight operation (for any account) would observe the
//! accumulator mid-update and double-count weight deltas. The guard
//! makes that rejection explicit instead of relying on host-runtime
//! isolation.

use crate::{EngineError, Result};

/// Engine-wide re-entrancy flag.
#[derive(Clone, Debug, Default)]
pub struct CallGuard {
    in_flight: bool,
}

impl CallGuard {
    /// Create a guard with no call in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a call as in flight.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ReentrantCall`] if a call is already in flight
    pub fn enter(&mut self) -> Result<()> {
        if self.in_flight {
            return Err(EngineError::ReentrantCall);
        }
        self.in_flight = true;
        Ok(())
    }

    /// Mark the in-flight call as finished. Must be called on every
    /// exit path, success or failure.
    pub fn exit(&mut self) {
        self.in_flight = false;
    }
}
