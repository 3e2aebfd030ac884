//! Lazy per-epoch weight accumulator.
//!
//! Tracks a principal amount and its accrued weight, and records the
//! weight observed at each epoch's closing boundary. State is only
//! touched at heights where an event actually happens: the weight at
//! an epoch close is computed in closed form from the last touch
//! (`weight + amount × elapsed`), never by iterating heights, so
//! catch-up cost is bounded by the number of elapsed epochs.
//!
//! The same type serves as the global accumulator and as the per-
//! position accumulator; summing position instances reproduces the
//! global instance exactly because every bucket is the same linear
//! function evaluated at the same boundary height.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cairn_epoch::EpochSchedule;

use crate::{LedgerError, Result};

/// A weight accumulator with lazily finalized epoch snapshots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeightAccumulator {
    /// Principal currently accruing weight.
    amount: u128,
    /// Accrued weight as of `last_height`.
    weight: u128,
    /// Height the accumulator was last advanced to.
    last_height: u64,
    /// Finalized weight per fully elapsed epoch. Immutable once written.
    buckets: BTreeMap<u64, u128>,
}

impl WeightAccumulator {
    /// Create an accumulator that begins accruing at `height`.
    pub fn at(height: u64) -> Self {
        Self {
            amount: 0,
            weight: 0,
            last_height: height,
            buckets: BTreeMap::new(),
        }
    }

    /// Principal currently accruing weight.
    pub fn amount(&self) -> u128 {
        self.amount
    }

    /// Accrued weight as of the last touch.
    pub fn weight(&self) -> u128 {
        self.weight
    }

    /// Height the accumulator was last advanced to.
    pub fn last_height(&self) -> u64 {
        self.last_height
    }

    /// Weight the accumulator will have reached at `height`, without
    /// mutating any state.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::HeightRegression`] if `height` precedes the last touch
    /// - [`LedgerError::ArithmeticOverflow`] on overflow
    pub fn weight_at(&self, height: u64) -> Result<u128> {
        let elapsed = height.checked_sub(self.last_height).ok_or(
            LedgerError::HeightRegression {
                last: self.last_height,
                height,
            },
        )?;
        let accrued = self
            .amount
            .checked_mul(u128::from(elapsed))
            .ok_or(LedgerError::ArithmeticOverflow)?;
        self.weight
            .checked_add(accrued)
            .ok_or(LedgerError::ArithmeticOverflow)
    }

    /// Advance the accumulator to `height`, finalizing a snapshot for
    /// every epoch that fully elapsed since the last touch.
    ///
    /// Must be called before any [`credit`](Self::credit) or
    /// [`drain`](Self::drain) at that height, so elapsed epochs close
    /// with the principal that was actually open during them.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::HeightRegression`] if `height` precedes the last touch
    /// - [`LedgerError::ArithmeticOverflow`] on overflow
    pub fn advance(&mut self, schedule: &EpochSchedule, height: u64) -> Result<()> {
        let from_epoch = schedule.epoch_of(self.last_height)?;
        let to_epoch = schedule.epoch_of(height)?;

        for epoch in from_epoch..to_epoch {
            let close = schedule.epoch_end_height(epoch)?;
            let at_close = self.weight_at(close)?;
            self.buckets.insert(epoch, at_close);
        }

        self.weight = self.weight_at(height)?;
        self.last_height = height;
        Ok(())
    }

    /// Apply a stake event: add principal and its event weight.
    ///
    /// The caller must have advanced the accumulator to the event
    /// height first.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ArithmeticOverflow`] on overflow
    pub fn credit(&mut self, amount: u128, weight: u128) -> Result<()> {
        self.amount = self
            .amount
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        self.weight = self
            .weight
            .checked_add(weight)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Remove principal and weight (the unstake side of an event).
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ArithmeticOverflow`] if more than is held would be removed
    pub fn debit(&mut self, amount: u128, weight: u128) -> Result<()> {
        self.amount = self
            .amount
            .checked_sub(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        self.weight = self
            .weight
            .checked_sub(weight)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Zero the accumulator and return `(amount, weight)` as drained.
    ///
    /// Finalized epoch snapshots are kept for auditability.
    pub fn drain(&mut self) -> (u128, u128) {
        let amount = self.amount;
        let weight = self.weight;
        self.amount = 0;
        self.weight = 0;
        (amount, weight)
    }

    /// The weight this accumulator had at the close of `epoch`.
    ///
    /// Returns the finalized snapshot when one exists. For epochs at
    /// or after the last touch the value is projected in closed form;
    /// it is only stable once the epoch has fully elapsed. Epochs
    /// before the accumulator existed report zero.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ArithmeticOverflow`] on overflow
    pub fn bucket_at_close(&self, schedule: &EpochSchedule, epoch: u64) -> Result<u128> {
        if let Some(weight) = self.buckets.get(&epoch) {
            return Ok(*weight);
        }
        if epoch >= schedule.epoch_of(self.last_height)? {
            let close = schedule.epoch_end_height(epoch)?;
            return self.weight_at(close);
        }
        Ok(0)
    }
}
