//! External collaborator interfaces.
//!
//! The engine owns stake accounting and nothing else. Balance
//! custody, accrual baselines, operator authorization, and the
//! monotonic height counter are all supplied by the hosting
//! environment through these traits.

use cairn_ledger::AccountId;

/// Failure reported by the custody collaborator (insufficient
/// balance, missing allowance, transfer rejected).
#[derive(Debug, thiserror::Error)]
#[error("custody transfer failed: {0}")]
pub struct CustodyError(pub String);

/// Moves the underlying fungible balance in and out of staking
/// custody. The engine calls `lock` on stake and `release` on
/// unstake/harvest; a failure aborts the surrounding operation before
/// any internal state is committed.
pub trait CustodyService {
    /// Pull `amount` from the account's free balance into staking custody.
    fn lock(&mut self, account: &AccountId, amount: u128) -> std::result::Result<(), CustodyError>;

    /// Pay the account `principal` out of its staking custody plus
    /// `reward` out of the pool reserve. Either part may be zero.
    fn release(
        &mut self,
        account: &AccountId,
        principal: u128,
        reward: u128,
    ) -> std::result::Result<(), CustodyError>;
}

/// Supplies the per-account accrual baseline: the height at which the
/// account's balance began accruing stake eligibility. Earlier
/// baselines earn proportionally more weight per unit staked.
pub trait BaselineSource {
    /// The account's current accrual baseline height.
    fn accrual_baseline(&self, account: &AccountId) -> u64;
}

/// Authorizes privileged callers for funding and scheduling.
pub trait OperatorGate {
    /// Whether `account` may perform privileged operations.
    fn is_operator(&self, account: &AccountId) -> bool;
}

/// The external monotonic height counter.
pub trait HeightClock {
    /// The current height. Never decreases between calls.
    fn current_height(&self) -> u64;
}
