//! Epoch schedule and height-to-epoch conversion.
//!
//! The conversion is a pure function of the genesis height and the
//! fixed epoch duration:
//!
//! ```text
//! epoch(h) = 1 + (h - genesis) / duration
//! ```
//!
//! Two heights inside the same duration window map to the same epoch
//! id. Heights before genesis have no epoch and are rejected.

use serde::{Deserialize, Serialize};

use crate::{EpochError, Result};

/// Epoch parameters fixed at engine construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EpochParams {
    /// Height at which epoch 1 begins.
    pub genesis_height: u64,
    /// Number of heights per epoch. Must be non-zero.
    pub epoch_duration_heights: u64,
}

/// A validated epoch schedule.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EpochSchedule {
    genesis_height: u64,
    epoch_duration: u64,
}

impl EpochSchedule {
    /// Build a schedule from parameters.
    ///
    /// # Errors
    ///
    /// - [`EpochError::InvalidDuration`] if the epoch duration is zero
    pub fn new(params: &EpochParams) -> Result<Self> {
        if params.epoch_duration_heights == 0 {
            return Err(EpochError::InvalidDuration);
        }
        Ok(Self {
            genesis_height: params.genesis_height,
            epoch_duration: params.epoch_duration_heights,
        })
    }

    /// The height at which epoch 1 begins.
    pub fn genesis_height(&self) -> u64 {
        self.genesis_height
    }

    /// Number of heights per epoch.
    pub fn epoch_duration(&self) -> u64 {
        self.epoch_duration
    }

    /// Compute the epoch id containing `height`.
    ///
    /// # Errors
    ///
    /// - [`EpochError::HeightOverflow`] if `height` precedes genesis
    pub fn epoch_of(&self, height: u64) -> Result<u64> {
        let relative = height
            .checked_sub(self.genesis_height)
            .ok_or(EpochError::HeightOverflow {
                height,
                genesis: self.genesis_height,
            })?;
        Ok(1 + relative / self.epoch_duration)
    }

    /// The first height inside `epoch`.
    ///
    /// Epoch ids start at 1; `epoch` 0 is treated as the genesis height.
    ///
    /// # Errors
    ///
    /// - [`EpochError::Overflow`] if the boundary exceeds `u64::MAX`
    pub fn epoch_start_height(&self, epoch: u64) -> Result<u64> {
        let offset = epoch
            .saturating_sub(1)
            .checked_mul(self.epoch_duration)
            .ok_or(EpochError::Overflow)?;
        self.genesis_height
            .checked_add(offset)
            .ok_or(EpochError::Overflow)
    }

    /// The first height *after* `epoch` (its exclusive closing boundary).
    ///
    /// # Errors
    ///
    /// - [`EpochError::Overflow`] if the boundary exceeds `u64::MAX`
    pub fn epoch_end_height(&self, epoch: u64) -> Result<u64> {
        let offset = epoch
            .checked_mul(self.epoch_duration)
            .ok_or(EpochError::Overflow)?;
        self.genesis_height
            .checked_add(offset)
            .ok_or(EpochError::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(genesis: u64, duration: u64) -> EpochSchedule {
        EpochSchedule::new(&EpochParams {
            genesis_height: genesis,
            epoch_duration_heights: duration,
        })
        .expect("valid schedule")
    }

    #[test]
    fn test_epoch_at_genesis_is_one() {
        let s = schedule(1000, 100);
        assert_eq!(s.epoch_of(1000).expect("epoch"), 1);
    }

    #[test]
    fn test_same_window_same_epoch() {
        let s = schedule(1000, 100);
        assert_eq!(s.epoch_of(1000).expect("epoch"), s.epoch_of(1099).expect("epoch"));
    }

    #[test]
    fn test_window_boundary_advances_epoch() {
        let s = schedule(1000, 100);
        assert_eq!(s.epoch_of(1099).expect("epoch"), 1);
        assert_eq!(s.epoch_of(1100).expect("epoch"), 2);
    }

    #[test]
    fn test_five_full_epochs_elapsed() {
        let s = schedule(1000, 100);
        assert_eq!(s.epoch_of(1500).expect("epoch"), 6);
    }

    #[test]
    fn test_height_before_genesis_rejected() {
        let s = schedule(2000, 100);
        let err = s.epoch_of(1000).expect_err("must reject");
        assert!(matches!(err, EpochError::HeightOverflow { height: 1000, genesis: 2000 }));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let result = EpochSchedule::new(&EpochParams {
            genesis_height: 0,
            epoch_duration_heights: 0,
        });
        assert!(matches!(result, Err(EpochError::InvalidDuration)));
    }

    #[test]
    fn test_epoch_boundaries() {
        let s = schedule(1000, 100);
        assert_eq!(s.epoch_start_height(1).expect("start"), 1000);
        assert_eq!(s.epoch_end_height(1).expect("end"), 1100);
        assert_eq!(s.epoch_start_height(3).expect("start"), 1200);
        assert_eq!(s.epoch_end_height(3).expect("end"), 1300);
    }

    #[test]
    fn test_end_height_is_next_epoch_start() {
        let s = schedule(500, 20);
        for e in 1..10 {
            assert_eq!(
                s.epoch_end_height(e).expect("end"),
                s.epoch_start_height(e + 1).expect("start")
            );
        }
    }

    #[test]
    fn test_params_parse_from_config_json() {
        let params: EpochParams = serde_json::from_str(
            r#"{"genesis_height": 1000, "epoch_duration_heights": 100}"#,
        )
        .expect("parse");
        let s = EpochSchedule::new(&params).expect("schedule");
        assert_eq!(s.genesis_height(), 1000);
        assert_eq!(s.epoch_duration(), 100);
    }

    #[test]
    fn test_boundary_overflow_rejected() {
        let s = schedule(u64::MAX - 10, 100);
        assert!(s.epoch_end_height(u64::MAX).is_err());
    }
}
