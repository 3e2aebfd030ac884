//! # cairn-ledger
//!
//! Stake positions and epoch-bucketed weight accounting.
//!
//! A position's weight is `amount × elapsed heights since the
//! account's accrual baseline`, summed over its stake events. Both
//! the global total and each position use the same lazy accumulator,
//! so the sum of position contributions equals the global total for
//! every epoch by construction.
//!
//! ## Modules
//!
//! - [`accumulator`] — Lazy per-epoch weight accumulator
//! - [`position`] — Stake position ledger

pub mod accumulator;
pub mod position;

pub use accumulator::WeightAccumulator;
pub use position::{AccountId, StakeLedger, StakePosition};

use cairn_epoch::EpochError;

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Stake amount was zero or the baseline lies ahead of the stake height.
    #[error("invalid stake amount")]
    InvalidAmount,

    /// Unstake or settlement attempted on an empty position.
    #[error("account holds no stake")]
    NotAStaker,

    /// Weight arithmetic exceeded the representable range.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// A height earlier than the accumulator's last touch was supplied.
    #[error("height {height} precedes last recorded height {last}")]
    HeightRegression {
        /// Last height the accumulator was advanced to.
        last: u64,
        /// The offending height.
        height: u64,
    },

    /// Epoch computation failed.
    #[error(transparent)]
    Epoch(#[from] EpochError),
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
