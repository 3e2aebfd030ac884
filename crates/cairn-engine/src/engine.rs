//! The [`StakeEngine`] facade.
//!
//! One mutating call at a time against a single shared state. Every
//! operation is all-or-nothing: validation and settlement math run
//! first, the external custody transfer second, and internal state
//! commits last — so a refused transfer leaves no observable
//! mutation, and the commit path has been pre-validated so it cannot
//! fail after the transfer has gone out.

use cairn_epoch::EpochParams;
use cairn_ledger::{AccountId, StakeLedger, StakePosition};
use cairn_pool::RewardPool;

use crate::claim::{self, Settlement};
use crate::guard::CallGuard;
use crate::traits::{BaselineSource, CustodyService, HeightClock, OperatorGate};
use crate::{EngineError, Result};

/// The epoch-weighted stake accounting engine.
pub struct StakeEngine {
    ledger: StakeLedger,
    pool: RewardPool,
    custody: Box<dyn CustodyService>,
    baselines: Box<dyn BaselineSource>,
    gate: Box<dyn OperatorGate>,
    clock: Box<dyn HeightClock>,
    guard: CallGuard,
}

impl StakeEngine {
    /// Build an engine over `params` and the external collaborators.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidParams`] if the epoch duration is zero
    pub fn new(
        params: &EpochParams,
        custody: Box<dyn CustodyService>,
        baselines: Box<dyn BaselineSource>,
        gate: Box<dyn OperatorGate>,
        clock: Box<dyn HeightClock>,
    ) -> Result<Self> {
        let schedule = cairn_epoch::EpochSchedule::new(params)?;
        Ok(Self {
            ledger: StakeLedger::new(schedule),
            pool: RewardPool::new(),
            custody,
            baselines,
            gate,
            clock,
            guard: CallGuard::new(),
        })
    }

    /// Lock `amount` into the caller's position.
    ///
    /// Returns the caller's new staked amount.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidAmount`] if `amount` is zero or custody
    ///   refuses the transfer-in
    /// - [`EngineError::HeightOverflow`] if the clock reads before genesis
    /// - [`EngineError::ReentrantCall`] / [`EngineError::ArithmeticOverflow`]
    pub fn stake(&mut self, caller: &AccountId, amount: u128) -> Result<u128> {
        self.guard.enter()?;
        let result = self.stake_inner(caller, amount);
        self.guard.exit();
        result
    }

    /// Return the caller's full principal plus any owed reward.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotAStaker`] if the position is empty
    /// - [`EngineError::Custody`] if the payout transfer is refused
    pub fn unstake(&mut self, caller: &AccountId) -> Result<u128> {
        self.guard.enter()?;
        let result = self.unstake_inner(caller);
        self.guard.exit();
        result
    }

    /// Pay out the caller's owed reward; the position stays open.
    ///
    /// A second call with no elapsed epoch in between pays zero.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotAStaker`] if the position is empty
    /// - [`EngineError::Custody`] if the payout transfer is refused
    pub fn harvest_all(&mut self, caller: &AccountId) -> Result<u128> {
        self.guard.enter()?;
        let result = self.harvest_inner(caller);
        self.guard.exit();
        result
    }

    /// Deposit `amount` into the reward treasury. Privileged.
    ///
    /// # Errors
    ///
    /// - [`EngineError::UnauthorizedCaller`] if the caller is not an operator
    /// - [`EngineError::InvalidAmount`] if `amount` is zero
    pub fn fund_pool(&mut self, caller: &AccountId, amount: u128) -> Result<()> {
        self.guard.enter()?;
        let result = self.fund_inner(caller, amount);
        self.guard.exit();
        result
    }

    /// Start a reward distribution over `duration_epochs` epochs,
    /// beginning at the current epoch. Privileged.
    ///
    /// Returns the per-epoch allocation.
    ///
    /// # Errors
    ///
    /// - [`EngineError::UnauthorizedCaller`] if the caller is not an operator
    /// - [`EngineError::InsufficientTreasury`] if unscheduled funds
    ///   cannot back the window
    pub fn initialize_schedule(&mut self, caller: &AccountId, duration_epochs: u64) -> Result<u128> {
        self.guard.enter()?;
        let result = self.schedule_inner(caller, duration_epochs);
        self.guard.exit();
        result
    }

    /// Extend the active distribution window by `duration_epochs`
    /// epochs (or start a new one when none is active). Privileged.
    ///
    /// # Errors
    ///
    /// Same conditions as [`initialize_schedule`](Self::initialize_schedule).
    pub fn extend_schedule(&mut self, caller: &AccountId, duration_epochs: u64) -> Result<u128> {
        self.guard.enter()?;
        let result = self.schedule_inner(caller, duration_epochs);
        self.guard.exit();
        result
    }

    // Read-only surface.

    /// The epoch containing `height`.
    pub fn epoch_of(&self, height: u64) -> Result<u64> {
        Ok(self.ledger.schedule().epoch_of(height)?)
    }

    /// Total weight at the close of `epoch` (finalized or projected).
    pub fn epoch_total_weight(&self, epoch: u64) -> Result<u128> {
        Ok(self.ledger.epoch_total_weight(epoch)?)
    }

    /// The reward allocated to `epoch`; fixed once the epoch has elapsed.
    pub fn epoch_reward(&self, epoch: u64) -> u128 {
        self.pool.epoch_reward(epoch)
    }

    /// The allocation `epoch` currently carries, elapsed or not.
    pub fn preview_epoch_reward(&self, epoch: u64) -> u128 {
        self.pool.preview_epoch_reward(epoch)
    }

    /// The caller's position, if any stake was ever recorded.
    pub fn position(&self, account: &AccountId) -> Option<&StakePosition> {
        self.ledger.position(account)
    }

    /// Cumulative rewards paid to `account`.
    pub fn claimed_total(&self, account: &AccountId) -> u128 {
        self.ledger.claimed_total(account)
    }

    /// Total stake weight at the current height.
    pub fn total_weight(&self) -> Result<u128> {
        Ok(self.ledger.total_weight_at(self.clock.current_height())?)
    }

    /// Total principal staked across all accounts.
    pub fn total_staked(&self) -> u128 {
        self.ledger.total_amount()
    }

    // Mutating internals. Each runs validate → transfer → commit.

    fn stake_inner(&mut self, caller: &AccountId, amount: u128) -> Result<u128> {
        let height = self.clock.current_height();
        let baseline = self.baselines.accrual_baseline(caller);

        self.ledger.check_stake(caller, amount, baseline, height)?;

        self.custody.lock(caller, amount).map_err(|err| {
            tracing::warn!(%err, amount, "stake transfer-in refused");
            EngineError::InvalidAmount
        })?;

        Ok(self.ledger.stake(caller, amount, baseline, height)?)
    }

    fn unstake_inner(&mut self, caller: &AccountId) -> Result<u128> {
        let height = self.clock.current_height();

        let principal = self.ledger.check_unstake(caller, height)?;
        let settlement = claim::compute_settlement(&self.ledger, &self.pool, caller, height)?;
        let payout = principal
            .checked_add(settlement.reward)
            .ok_or(EngineError::ArithmeticOverflow)?;

        self.custody.release(caller, principal, settlement.reward)?;

        self.commit_settlement(caller, &settlement)?;
        self.ledger.unstake(caller, height)?;

        tracing::info!(principal, reward = settlement.reward, "unstaked");
        Ok(payout)
    }

    fn harvest_inner(&mut self, caller: &AccountId) -> Result<u128> {
        let height = self.clock.current_height();

        self.ledger.check_unstake(caller, height)?;
        let settlement = claim::compute_settlement(&self.ledger, &self.pool, caller, height)?;

        if settlement.reward > 0 {
            self.custody.release(caller, 0, settlement.reward)?;
        }
        self.commit_settlement(caller, &settlement)?;

        tracing::info!(reward = settlement.reward, "harvested");
        Ok(settlement.reward)
    }

    fn fund_inner(&mut self, caller: &AccountId, amount: u128) -> Result<()> {
        if !self.gate.is_operator(caller) {
            return Err(EngineError::UnauthorizedCaller);
        }
        Ok(self.pool.fund(amount)?)
    }

    fn schedule_inner(&mut self, caller: &AccountId, duration_epochs: u64) -> Result<u128> {
        if !self.gate.is_operator(caller) {
            return Err(EngineError::UnauthorizedCaller);
        }
        let current_epoch = self.ledger.schedule().epoch_of(self.clock.current_height())?;
        Ok(self.pool.schedule(current_epoch, duration_epochs)?)
    }

    /// Advance the settlement checkpoint even for zero rewards, so
    /// already-walked epochs are never walked again.
    fn commit_settlement(&mut self, caller: &AccountId, settlement: &Settlement) -> Result<()> {
        Ok(self
            .ledger
            .record_claim(caller, settlement.reward, settlement.settled_through)?)
    }
}
