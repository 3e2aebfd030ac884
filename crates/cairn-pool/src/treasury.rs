//! Funded/scheduled balance bookkeeping.
//!
//! Invariant: `total_scheduled <= total_funded` at all times. Both
//! totals are monotone; nothing is ever un-funded or un-scheduled.

use serde::{Deserialize, Serialize};

use crate::{PoolError, Result};

/// The reward treasury.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RewardTreasury {
    total_funded: u128,
    total_scheduled: u128,
}

impl RewardTreasury {
    /// Create an empty treasury.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cumulative funds ever deposited.
    pub fn total_funded(&self) -> u128 {
        self.total_funded
    }

    /// Cumulative funds ever committed to epoch allocations.
    pub fn total_scheduled(&self) -> u128 {
        self.total_scheduled
    }

    /// Funds deposited but not yet committed to any epoch.
    pub fn available(&self) -> u128 {
        // Invariant: total_scheduled <= total_funded.
        self.total_funded - self.total_scheduled
    }

    /// Deposit `amount` into the treasury.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ZeroAmount`] if `amount` is zero
    /// - [`PoolError::ArithmeticOverflow`] on overflow
    pub fn fund(&mut self, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(PoolError::ZeroAmount);
        }
        self.total_funded = self
            .total_funded
            .checked_add(amount)
            .ok_or(PoolError::ArithmeticOverflow)?;

        tracing::info!(amount, total_funded = self.total_funded, "treasury funded");
        Ok(())
    }

    /// Commit `amount` of available funds to epoch allocations.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ArithmeticOverflow`] if the commitment would
    ///   push scheduled funds past funded funds
    pub fn commit(&mut self, amount: u128) -> Result<()> {
        let scheduled = self
            .total_scheduled
            .checked_add(amount)
            .ok_or(PoolError::ArithmeticOverflow)?;
        if scheduled > self.total_funded {
            return Err(PoolError::ArithmeticOverflow);
        }
        self.total_scheduled = scheduled;
        Ok(())
    }
}
