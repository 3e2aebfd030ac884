//! Settlement math.
//!
//! Walks an account's unsettled epochs and sums its pro-rata share of
//! each epoch's reward. Only fully elapsed epochs pay: the epoch
//! containing `upto_height` is still open and its snapshot is not
//! final. The walk is read-only; callers commit the resulting
//! checkpoint only after the external payout has gone through, so a
//! failed transfer leaves no trace.
//!
//! Shares are computed in fixed point: each epoch contributes
//! `reward × weight × REWARD_SCALE / total`, with the single
//! truncating division last so its error is never amplified by the
//! reward magnitude; the scaled per-epoch amounts are summed and
//! divided back down once at the end, so cumulative rounding error
//! stays below one unit regardless of how many epochs settle.

use serde::{Deserialize, Serialize};

use cairn_ledger::{AccountId, StakeLedger};
use cairn_pool::RewardPool;

use crate::{EngineError, Result};

/// Fixed-point scale for pro-rata shares.
pub const REWARD_SCALE: u128 = 1_000_000_000_000;

/// Outcome of a settlement walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Total reward owed across the settled epochs.
    pub reward: u128,
    /// The last epoch the walk covered; the account's new checkpoint.
    pub settled_through: u64,
}

/// Compute the reward owed to `account` for every fully elapsed epoch
/// after its settlement checkpoint, up to (excluding) the epoch
/// containing `upto_height`.
///
/// Epochs with zero total weight or zero allocation contribute
/// nothing. Mutates nothing.
///
/// # Errors
///
/// - [`EngineError::NotAStaker`] if the account has no position
/// - [`EngineError::HeightOverflow`] if `upto_height` precedes genesis
/// - [`EngineError::ArithmeticOverflow`] on overflow
pub fn compute_settlement(
    ledger: &StakeLedger,
    pool: &RewardPool,
    account: &AccountId,
    upto_height: u64,
) -> Result<Settlement> {
    let position = ledger.position(account).ok_or(EngineError::NotAStaker)?;
    let current_epoch = ledger.schedule().epoch_of(upto_height)?;
    let last_settled = position.last_settled_epoch();

    // The current epoch is still open; settle through its predecessor.
    let target = current_epoch - 1;
    if target <= last_settled {
        return Ok(Settlement {
            reward: 0,
            settled_through: last_settled,
        });
    }

    let mut scaled_total: u128 = 0;
    for epoch in (last_settled + 1)..=target {
        let epoch_reward = pool.epoch_reward(epoch);
        if epoch_reward == 0 {
            continue;
        }
        let total_weight = ledger.epoch_total_weight(epoch)?;
        if total_weight == 0 {
            continue;
        }
        let account_weight = ledger.account_weight_in_epoch(account, epoch)?;
        if account_weight == 0 {
            continue;
        }

        let scaled = epoch_reward
            .checked_mul(account_weight)
            .and_then(|v| v.checked_mul(REWARD_SCALE))
            .ok_or(EngineError::ArithmeticOverflow)?
            / total_weight;
        scaled_total = scaled_total
            .checked_add(scaled)
            .ok_or(EngineError::ArithmeticOverflow)?;
    }

    let reward = scaled_total / REWARD_SCALE;

    // The commit path adds this to the claimed total; make sure it
    // cannot fail after the payout has already gone out.
    position
        .claimed_total()
        .checked_add(reward)
        .ok_or(EngineError::ArithmeticOverflow)?;

    tracing::trace!(
        reward,
        from_epoch = last_settled + 1,
        settled_through = target,
        "settlement computed"
    );
    Ok(Settlement {
        reward,
        settled_through: target,
    })
}
