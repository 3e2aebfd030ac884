//! # cairn-pool
//!
//! Reward treasury and per-epoch distribution schedule.
//!
//! Funding grows the treasury; scheduling carves unscheduled funds
//! into equal per-epoch allocations over a distribution window. The
//! treasury enforces that scheduled rewards can never exceed funded
//! balance, so the per-epoch allocation table is always fully backed.
//!
//! ## Modules
//!
//! - [`treasury`] — Funded/scheduled balance bookkeeping
//! - [`pool`] — Distribution windows and epoch allocations

pub mod pool;
pub mod treasury;

pub use pool::RewardPool;
pub use treasury::RewardTreasury;

/// Error types for reward pool operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Funding amount was zero.
    #[error("amount must be non-zero")]
    ZeroAmount,

    /// Scheduling window must span at least one epoch.
    #[error("distribution duration must be non-zero")]
    InvalidDuration,

    /// The schedule would not be backed by funded balance.
    #[error("insufficient treasury: {available} available for {requested} epochs")]
    InsufficientTreasury {
        /// Unscheduled funds currently available.
        available: u128,
        /// Number of epochs the schedule would have to cover.
        requested: u64,
    },

    /// Treasury arithmetic exceeded the representable range.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

/// Convenience result type for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;
