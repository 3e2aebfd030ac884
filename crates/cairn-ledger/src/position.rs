//! Stake position ledger.
//!
//! One record per account plus the global accumulator, mutated
//! together so the two can never drift. Positions are zeroed on full
//! unstake, never removed; cumulative claimed totals survive for
//! auditability.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cairn_epoch::EpochSchedule;

use crate::accumulator::WeightAccumulator;
use crate::{LedgerError, Result};

/// Opaque account identifier.
pub type AccountId = [u8; 32];

/// Per-account stake record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StakePosition {
    acc: WeightAccumulator,
    last_action_height: u64,
    last_settled_epoch: u64,
    claimed_total: u128,
}

impl StakePosition {
    fn new(height: u64, preceding_epoch: u64) -> Self {
        Self {
            acc: WeightAccumulator::at(height),
            last_action_height: height,
            last_settled_epoch: preceding_epoch,
            claimed_total: 0,
        }
    }

    /// Principal currently staked.
    pub fn staked_amount(&self) -> u128 {
        self.acc.amount()
    }

    /// Accrued weight as of the last stake/unstake event.
    pub fn staked_weight(&self) -> u128 {
        self.acc.weight()
    }

    /// Height of the last stake/unstake event.
    pub fn last_action_height(&self) -> u64 {
        self.last_action_height
    }

    /// Last epoch whose reward has been settled for this account.
    pub fn last_settled_epoch(&self) -> u64 {
        self.last_settled_epoch
    }

    /// Cumulative rewards paid out to this account. Monotone.
    pub fn claimed_total(&self) -> u128 {
        self.claimed_total
    }
}

/// The stake ledger: all positions plus the global weight accumulator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StakeLedger {
    schedule: EpochSchedule,
    total: WeightAccumulator,
    positions: BTreeMap<AccountId, StakePosition>,
}

impl StakeLedger {
    /// Create an empty ledger over `schedule`.
    pub fn new(schedule: EpochSchedule) -> Self {
        let genesis = schedule.genesis_height();
        Self {
            schedule,
            total: WeightAccumulator::at(genesis),
            positions: BTreeMap::new(),
        }
    }

    /// The epoch schedule this ledger accounts against.
    pub fn schedule(&self) -> &EpochSchedule {
        &self.schedule
    }

    /// Validate a stake without mutating anything.
    ///
    /// Runs every check the commit path runs, so a stake that passes
    /// here cannot fail after the external custody transfer has gone
    /// through.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `amount` is zero or `baseline > height`
    /// - [`LedgerError::Epoch`] if `height` precedes genesis
    /// - [`LedgerError::ArithmeticOverflow`] if the resulting weight would overflow
    pub fn check_stake(
        &self,
        account: &AccountId,
        amount: u128,
        baseline: u64,
        height: u64,
    ) -> Result<()> {
        let delta = Self::event_weight(amount, baseline, height)?;
        self.schedule.epoch_of(height)?;

        self.total
            .weight_at(height)?
            .checked_add(delta)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        self.total
            .amount()
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        if let Some(position) = self.positions.get(account) {
            position
                .acc
                .weight_at(height)?
                .checked_add(delta)
                .ok_or(LedgerError::ArithmeticOverflow)?;
        }
        Ok(())
    }

    /// Record a stake of `amount` at `height`, with the account's
    /// externally supplied accrual `baseline`.
    ///
    /// Returns the account's new staked amount.
    ///
    /// # Errors
    ///
    /// Same conditions as [`check_stake`](Self::check_stake).
    pub fn stake(
        &mut self,
        account: &AccountId,
        amount: u128,
        baseline: u64,
        height: u64,
    ) -> Result<u128> {
        self.check_stake(account, amount, baseline, height)?;

        let delta = Self::event_weight(amount, baseline, height)?;
        let current_epoch = self.schedule.epoch_of(height)?;

        self.total.advance(&self.schedule, height)?;

        let position = self
            .positions
            .entry(*account)
            .or_insert_with(|| StakePosition::new(height, current_epoch - 1));
        if position.acc.amount() == 0 {
            // First stake, or first stake of a new stint after a full
            // unstake: the account must not be credited for epochs it
            // sat out.
            position.last_settled_epoch = current_epoch - 1;
        }
        position.acc.advance(&self.schedule, height)?;
        position.acc.credit(amount, delta)?;
        position.last_action_height = height;
        let staked = position.acc.amount();

        self.total.credit(amount, delta)?;

        tracing::info!(amount, height, weight = delta, "stake recorded");
        Ok(staked)
    }

    /// Validate an unstake without mutating anything, returning the
    /// principal that would be handed back.
    ///
    /// # Errors
    ///
    /// Same conditions as [`unstake`](Self::unstake).
    pub fn check_unstake(&self, account: &AccountId, height: u64) -> Result<u128> {
        let position = self
            .positions
            .get(account)
            .filter(|p| p.acc.amount() > 0)
            .ok_or(LedgerError::NotAStaker)?;
        position.acc.weight_at(height)?;
        self.total.weight_at(height)?;
        Ok(position.acc.amount())
    }

    /// Zero an account's position and return the principal to hand
    /// back. The caller is responsible for settling rewards first.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotAStaker`] if the position is empty
    /// - [`LedgerError::HeightRegression`] / [`LedgerError::ArithmeticOverflow`] on bad input
    pub fn unstake(&mut self, account: &AccountId, height: u64) -> Result<u128> {
        let position = self
            .positions
            .get_mut(account)
            .filter(|p| p.acc.amount() > 0)
            .ok_or(LedgerError::NotAStaker)?;

        position.acc.advance(&self.schedule, height)?;
        self.total.advance(&self.schedule, height)?;

        let (amount, weight) = position.acc.drain();
        position.last_action_height = height;
        self.total.debit(amount, weight)?;

        tracing::info!(amount, height, "unstake recorded");
        Ok(amount)
    }

    /// Record a settled claim: advance the account's settlement
    /// checkpoint and add `reward` to its cumulative claimed total.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotAStaker`] if the account has no position
    /// - [`LedgerError::ArithmeticOverflow`] on overflow
    pub fn record_claim(
        &mut self,
        account: &AccountId,
        reward: u128,
        settled_through: u64,
    ) -> Result<()> {
        let position = self
            .positions
            .get_mut(account)
            .ok_or(LedgerError::NotAStaker)?;
        position.claimed_total = position
            .claimed_total
            .checked_add(reward)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        position.last_settled_epoch = position.last_settled_epoch.max(settled_through);

        tracing::info!(reward, settled_through, "claim recorded");
        Ok(())
    }

    /// Look up an account's position.
    pub fn position(&self, account: &AccountId) -> Option<&StakePosition> {
        self.positions.get(account)
    }

    /// Cumulative rewards paid to an account (zero if unknown).
    pub fn claimed_total(&self, account: &AccountId) -> u128 {
        self.positions
            .get(account)
            .map(StakePosition::claimed_total)
            .unwrap_or(0)
    }

    /// Total principal staked across all accounts.
    pub fn total_amount(&self) -> u128 {
        self.total.amount()
    }

    /// Total weight at `height`, computed without mutation.
    pub fn total_weight_at(&self, height: u64) -> Result<u128> {
        self.total.weight_at(height)
    }

    /// Total weight at the close of `epoch` (finalized or projected).
    pub fn epoch_total_weight(&self, epoch: u64) -> Result<u128> {
        self.total.bucket_at_close(&self.schedule, epoch)
    }

    /// An account's weight contribution at the close of `epoch`.
    pub fn account_weight_in_epoch(&self, account: &AccountId, epoch: u64) -> Result<u128> {
        match self.positions.get(account) {
            Some(position) => position.acc.bucket_at_close(&self.schedule, epoch),
            None => Ok(0),
        }
    }

    fn event_weight(amount: u128, baseline: u64, height: u64) -> Result<u128> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let elapsed = height
            .checked_sub(baseline)
            .ok_or(LedgerError::InvalidAmount)?;
        amount
            .checked_mul(u128::from(elapsed))
            .ok_or(LedgerError::ArithmeticOverflow)
    }
}
