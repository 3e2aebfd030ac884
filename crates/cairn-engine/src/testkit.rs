//! In-memory collaborator implementations for tests.
//!
//! Each type hands out cloneable handles over shared state so a test
//! can keep driving the clock or inspecting balances after the engine
//! has taken ownership of its collaborator boxes.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use cairn_ledger::AccountId;

use crate::traits::{BaselineSource, CustodyError, CustodyService, HeightClock, OperatorGate};

/// A height clock driven by the test.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    /// Create a clock reading `height`.
    pub fn new(height: u64) -> Self {
        Self(Arc::new(AtomicU64::new(height)))
    }

    /// Jump the clock to `height`.
    pub fn set(&self, height: u64) {
        self.0.store(height, Ordering::SeqCst);
    }

    /// Advance the clock by `delta` heights.
    pub fn advance(&self, delta: u64) {
        self.0.fetch_add(delta, Ordering::SeqCst);
    }
}

impl HeightClock for ManualClock {
    fn current_height(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct CustodyState {
    free: BTreeMap<AccountId, u128>,
    staked: BTreeMap<AccountId, u128>,
    reserve: u128,
    refuse_releases: bool,
}

/// An in-memory custody ledger.
///
/// Stake locks move balance from `free` to `staked`; releases pay
/// principal out of the account's staked balance and rewards out of
/// the pool reserve, mirroring a custody account that holds both
/// staked principal and the funded reward pool.
#[derive(Clone, Debug, Default)]
pub struct MemoryCustody {
    inner: Arc<Mutex<CustodyState>>,
}

impl MemoryCustody {
    fn state(&self) -> std::sync::MutexGuard<'_, CustodyState> {
        self.inner.lock().expect("custody state poisoned")
    }

    /// Give `account` free balance to stake from.
    pub fn mint(&self, account: &AccountId, amount: u128) {
        *self.state().free.entry(*account).or_insert(0) += amount;
    }

    /// Mirror an out-of-band treasury transfer into custody.
    pub fn fund_reserve(&self, amount: u128) {
        self.state().reserve += amount;
    }

    /// Make every release fail until cleared, for rollback tests.
    pub fn refuse_releases(&self, refuse: bool) {
        self.state().refuse_releases = refuse;
    }

    /// The account's free (unstaked) balance.
    pub fn free_balance(&self, account: &AccountId) -> u128 {
        self.state().free.get(account).copied().unwrap_or(0)
    }

    /// The account's balance held in staking custody.
    pub fn staked_balance(&self, account: &AccountId) -> u128 {
        self.state().staked.get(account).copied().unwrap_or(0)
    }

    /// Total balance held in staking custody across all accounts.
    pub fn staked_total(&self) -> u128 {
        self.state().staked.values().sum()
    }
}

impl CustodyService for MemoryCustody {
    fn lock(&mut self, account: &AccountId, amount: u128) -> Result<(), CustodyError> {
        let mut state = self.state();
        let free = state.free.entry(*account).or_insert(0);
        if *free < amount {
            return Err(CustodyError(format!(
                "insufficient balance: {free} < {amount}"
            )));
        }
        *free -= amount;
        *state.staked.entry(*account).or_insert(0) += amount;
        Ok(())
    }

    fn release(
        &mut self,
        account: &AccountId,
        principal: u128,
        reward: u128,
    ) -> Result<(), CustodyError> {
        let mut state = self.state();
        if state.refuse_releases {
            return Err(CustodyError("release refused".to_string()));
        }
        let staked = state.staked.entry(*account).or_insert(0);
        if *staked < principal {
            return Err(CustodyError(format!(
                "insufficient staked balance: {staked} < {principal}"
            )));
        }
        if state.reserve < reward {
            return Err(CustodyError(format!(
                "insufficient reserve: {} < {reward}",
                state.reserve
            )));
        }
        *state.staked.entry(*account).or_insert(0) -= principal;
        state.reserve -= reward;
        *state.free.entry(*account).or_insert(0) += principal + reward;
        Ok(())
    }
}

/// Per-account accrual baselines, defaulting to zero.
#[derive(Clone, Debug, Default)]
pub struct FixedBaselines {
    baselines: BTreeMap<AccountId, u64>,
}

impl FixedBaselines {
    /// Set `account`'s baseline height.
    pub fn with(mut self, account: &AccountId, baseline: u64) -> Self {
        self.baselines.insert(*account, baseline);
        self
    }
}

impl BaselineSource for FixedBaselines {
    fn accrual_baseline(&self, account: &AccountId) -> u64 {
        self.baselines.get(account).copied().unwrap_or(0)
    }
}

/// A fixed operator allow-list.
#[derive(Clone, Debug, Default)]
pub struct StaticOperators {
    operators: BTreeSet<AccountId>,
}

impl StaticOperators {
    /// Allow exactly `accounts`.
    pub fn with(accounts: &[AccountId]) -> Self {
        Self {
            operators: accounts.iter().copied().collect(),
        }
    }
}

impl OperatorGate for StaticOperators {
    fn is_operator(&self, account: &AccountId) -> bool {
        self.operators.contains(account)
    }
}
