//! # cairn-engine
//!
//! Epoch-weighted stake accounting engine.
//!
//! Ties the epoch schedule, the stake ledger, and the reward pool
//! together behind a single call boundary, and drives settlement: on
//! demand it walks an account's unsettled epochs, computes the
//! pro-rata share of each epoch's reward from the weight snapshots,
//! and pays out through the external custody collaborator.
//!
//! Custody, accrual baselines, operator authorization, and the height
//! clock are consumed through traits; the engine never produces
//! heights or moves balances itself.
//!
//! ## Modules
//!
//! - [`traits`] — External collaborator interfaces
//! - [`guard`] — Call-in-progress guard
//! - [`claim`] — Settlement math
//! - [`engine`] — The [`StakeEngine`] facade
//! - [`testkit`] — In-memory collaborator implementations for tests

pub mod claim;
pub mod engine;
pub mod guard;
pub mod testkit;
pub mod traits;

pub use engine::StakeEngine;
pub use traits::{BaselineSource, CustodyError, CustodyService, HeightClock, OperatorGate};

use cairn_epoch::EpochError;
use cairn_ledger::LedgerError;
use cairn_pool::PoolError;

/// Error kinds surfaced at the engine call boundary.
///
/// Every failure aborts the whole operation with no state change;
/// nothing is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Stake amount was zero, malformed, or unaffordable.
    #[error("invalid stake amount")]
    InvalidAmount,

    /// Unstake or harvest attempted on an empty position.
    #[error("account holds no stake")]
    NotAStaker,

    /// A height earlier than genesis was supplied.
    #[error("height {height} precedes genesis height {genesis}")]
    HeightOverflow {
        /// The offending height.
        height: u64,
        /// The genesis height.
        genesis: u64,
    },

    /// Scheduling would exceed the funded treasury balance.
    #[error("insufficient treasury: {available} available for {requested} epochs")]
    InsufficientTreasury {
        /// Unscheduled funds currently available.
        available: u128,
        /// Number of epochs the schedule would have to cover.
        requested: u64,
    },

    /// Privileged operation attempted by a non-operator.
    #[error("caller is not an operator")]
    UnauthorizedCaller,

    /// A call arrived while another call was still unsettled.
    #[error("re-entrant call rejected")]
    ReentrantCall,

    /// Weight or reward arithmetic exceeded the representable range.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// The external custody collaborator refused a payout transfer.
    #[error(transparent)]
    Custody(#[from] CustodyError),

    /// Engine parameters were invalid at construction.
    #[error("invalid engine parameters: {0}")]
    InvalidParams(&'static str),
}

impl From<EpochError> for EngineError {
    fn from(err: EpochError) -> Self {
        match err {
            EpochError::HeightOverflow { height, genesis } => {
                EngineError::HeightOverflow { height, genesis }
            }
            EpochError::InvalidDuration => EngineError::InvalidParams("epoch duration"),
            EpochError::Overflow => EngineError::ArithmeticOverflow,
        }
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidAmount => EngineError::InvalidAmount,
            LedgerError::NotAStaker => EngineError::NotAStaker,
            LedgerError::ArithmeticOverflow | LedgerError::HeightRegression { .. } => {
                EngineError::ArithmeticOverflow
            }
            LedgerError::Epoch(inner) => inner.into(),
        }
    }
}

impl From<PoolError> for EngineError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::ZeroAmount => EngineError::InvalidAmount,
            PoolError::InvalidDuration => EngineError::InvalidParams("distribution duration"),
            PoolError::InsufficientTreasury {
                available,
                requested,
            } => EngineError::InsufficientTreasury {
                available,
                requested,
            },
            PoolError::ArithmeticOverflow => EngineError::ArithmeticOverflow,
        }
    }
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
