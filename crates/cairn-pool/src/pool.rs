//! Distribution windows and epoch allocations.
//!
//! A schedule call carves the treasury's unscheduled funds evenly
//! across a window of epochs. When no distribution is active the
//! window opens at the current epoch; while one is active the window
//! is appended after its end. Each epoch's allocation is written
//! exactly once, so an allocation is immutable from the moment it is
//! set — in particular once its epoch has elapsed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::treasury::RewardTreasury;
use crate::{PoolError, Result};

/// Reward treasury plus the per-epoch allocation table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RewardPool {
    treasury: RewardTreasury,
    /// epoch id → reward committed to that epoch.
    allocations: BTreeMap<u64, u128>,
    /// Last epoch of the active distribution window (0 = never scheduled).
    end_epoch: u64,
}

impl RewardPool {
    /// Create an unfunded pool with no schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposit `amount` into the treasury.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ZeroAmount`] if `amount` is zero
    /// - [`PoolError::ArithmeticOverflow`] on overflow
    pub fn fund(&mut self, amount: u128) -> Result<()> {
        self.treasury.fund(amount)
    }

    /// Whether a distribution window covers `current_epoch`.
    pub fn is_active(&self, current_epoch: u64) -> bool {
        self.end_epoch >= current_epoch
    }

    /// Last epoch of the distribution window (0 if never scheduled).
    pub fn end_epoch(&self) -> u64 {
        self.end_epoch
    }

    /// Cumulative funds deposited.
    pub fn total_funded(&self) -> u128 {
        self.treasury.total_funded()
    }

    /// Cumulative funds committed to epoch allocations.
    pub fn total_scheduled(&self) -> u128 {
        self.treasury.total_scheduled()
    }

    /// Start a distribution, or extend the active one, by
    /// `duration_epochs` epochs.
    ///
    /// The window opens at `current_epoch` when no distribution is
    /// active, otherwise right after the active window's end. Every
    /// epoch in the new window receives `available / duration_epochs`;
    /// the division remainder stays in the treasury for a later
    /// schedule.
    ///
    /// Returns the per-epoch allocation.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidDuration`] if `duration_epochs` is zero
    /// - [`PoolError::InsufficientTreasury`] if unscheduled funds
    ///   cannot back at least one unit per epoch
    pub fn schedule(&mut self, current_epoch: u64, duration_epochs: u64) -> Result<u128> {
        if duration_epochs == 0 {
            return Err(PoolError::InvalidDuration);
        }

        let available = self.treasury.available();
        let per_epoch = available / u128::from(duration_epochs);
        if per_epoch == 0 {
            return Err(PoolError::InsufficientTreasury {
                available,
                requested: duration_epochs,
            });
        }

        let first = if self.is_active(current_epoch) {
            self.end_epoch + 1
        } else {
            current_epoch
        };
        let last = first
            .checked_add(duration_epochs - 1)
            .ok_or(PoolError::ArithmeticOverflow)?;

        let committed = per_epoch
            .checked_mul(u128::from(duration_epochs))
            .ok_or(PoolError::ArithmeticOverflow)?;
        self.treasury.commit(committed)?;

        for epoch in first..=last {
            self.allocations.insert(epoch, per_epoch);
        }
        self.end_epoch = last;

        tracing::info!(
            first_epoch = first,
            last_epoch = last,
            per_epoch,
            "distribution scheduled"
        );
        Ok(per_epoch)
    }

    /// The reward allocated to `epoch`. Fixed once the epoch has
    /// elapsed; zero for epochs outside every scheduled window.
    pub fn epoch_reward(&self, epoch: u64) -> u128 {
        self.allocations.get(&epoch).copied().unwrap_or(0)
    }

    /// The allocation `epoch` currently carries, including epochs
    /// that have not elapsed yet. For future epochs inside the active
    /// window this is the value [`epoch_reward`](Self::epoch_reward)
    /// will report once the epoch closes.
    pub fn preview_epoch_reward(&self, epoch: u64) -> u128 {
        self.epoch_reward(epoch)
    }

    /// Sum of all allocations ever committed. Bounded by
    /// [`total_funded`](Self::total_funded).
    pub fn scheduled_sum(&self) -> u128 {
        self.allocations.values().sum()
    }
}
