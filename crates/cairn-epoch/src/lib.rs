//! # cairn-epoch
//!
//! Epoch indexing over a monotonic height counter.
//!
//! Heights are supplied by the hosting environment and are never
//! produced here. An epoch is a fixed-length window of heights; epoch
//! ids start at 1 at the genesis height.
//!
//! ## Modules
//!
//! - [`schedule`] — Epoch schedule and height-to-epoch conversion

pub mod schedule;

pub use schedule::{EpochParams, EpochSchedule};

/// Error types for epoch computations.
#[derive(Debug, thiserror::Error)]
pub enum EpochError {
    /// A height earlier than genesis has no epoch.
    #[error("height {height} precedes genesis height {genesis}")]
    HeightOverflow {
        /// The offending height.
        height: u64,
        /// The genesis height of the schedule.
        genesis: u64,
    },

    /// Epoch duration must be at least one height.
    #[error("epoch duration must be non-zero")]
    InvalidDuration,

    /// Arithmetic overflow computing an epoch boundary.
    #[error("arithmetic overflow")]
    Overflow,
}

/// Convenience result type for epoch operations.
pub type Result<T> = std::result::Result<T, EpochError>;
