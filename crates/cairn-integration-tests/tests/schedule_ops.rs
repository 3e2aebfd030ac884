//! Funding and distribution scheduling through the engine surface.

use cairn_engine::testkit::{FixedBaselines, ManualClock, MemoryCustody, StaticOperators};
use cairn_engine::{EngineError, StakeEngine};
use cairn_epoch::EpochParams;
use cairn_ledger::AccountId;

const OPERATOR: AccountId = [0xAA; 32];
const INTRUDER: AccountId = [0x66; 32];

const GENESIS: u64 = 1000;
const DURATION: u64 = 100;

fn engine_with(clock: &ManualClock) -> StakeEngine {
    StakeEngine::new(
        &EpochParams {
            genesis_height: GENESIS,
            epoch_duration_heights: DURATION,
        },
        Box::new(MemoryCustody::default()),
        Box::new(FixedBaselines::default()),
        Box::new(StaticOperators::with(&[OPERATOR])),
        Box::new(clock.clone()),
    )
    .expect("engine")
}

#[test]
fn non_operator_cannot_fund_or_schedule() {
    let clock = ManualClock::new(GENESIS);
    let mut engine = engine_with(&clock);

    assert!(matches!(
        engine.fund_pool(&INTRUDER, 500),
        Err(EngineError::UnauthorizedCaller)
    ));
    assert!(matches!(
        engine.extend_schedule(&INTRUDER, 2),
        Err(EngineError::UnauthorizedCaller)
    ));
    assert_eq!(engine.preview_epoch_reward(1), 0);
}

#[test]
fn unfunded_schedule_is_rejected() {
    let clock = ManualClock::new(GENESIS);
    let mut engine = engine_with(&clock);

    assert!(matches!(
        engine.initialize_schedule(&OPERATOR, 5),
        Err(EngineError::InsufficientTreasury {
            available: 0,
            requested: 5
        })
    ));
}

#[test]
fn zero_funding_is_rejected() {
    let clock = ManualClock::new(GENESIS);
    let mut engine = engine_with(&clock);

    assert!(matches!(
        engine.fund_pool(&OPERATOR, 0),
        Err(EngineError::InvalidAmount)
    ));
}

#[test]
fn extension_appends_after_the_active_window() {
    let clock = ManualClock::new(GENESIS);
    let mut engine = engine_with(&clock);

    engine.fund_pool(&OPERATOR, 400).expect("fund");
    assert_eq!(engine.initialize_schedule(&OPERATOR, 2).expect("init"), 200);

    engine.fund_pool(&OPERATOR, 300).expect("fund");
    assert_eq!(engine.extend_schedule(&OPERATOR, 3).expect("extend"), 100);

    assert_eq!(engine.preview_epoch_reward(1), 200);
    assert_eq!(engine.preview_epoch_reward(2), 200);
    for epoch in 3..=5 {
        assert_eq!(engine.preview_epoch_reward(epoch), 100);
    }
    assert_eq!(engine.preview_epoch_reward(6), 0);
}

#[test]
fn lapsed_window_reopens_at_the_current_epoch() {
    let clock = ManualClock::new(GENESIS);
    let mut engine = engine_with(&clock);

    engine.fund_pool(&OPERATOR, 200).expect("fund");
    engine.initialize_schedule(&OPERATOR, 2).expect("init");

    // Window 1..=2 has lapsed by epoch 8; the next schedule starts
    // there, leaving the gap epochs unrewarded.
    clock.set(1700);
    engine.fund_pool(&OPERATOR, 100).expect("fund");
    engine.extend_schedule(&OPERATOR, 1).expect("extend");

    assert_eq!(engine.epoch_of(1700).expect("epoch"), 8);
    assert_eq!(engine.preview_epoch_reward(8), 100);
    for epoch in 3..=7 {
        assert_eq!(engine.preview_epoch_reward(epoch), 0);
    }
}

#[test]
fn elapsed_allocations_survive_later_scheduling() {
    let clock = ManualClock::new(GENESIS);
    let mut engine = engine_with(&clock);

    engine.fund_pool(&OPERATOR, 500).expect("fund");
    engine.initialize_schedule(&OPERATOR, 1).expect("init");

    clock.set(1150);
    assert_eq!(engine.epoch_reward(1), 500);

    engine.fund_pool(&OPERATOR, 900).expect("fund");
    engine.extend_schedule(&OPERATOR, 3).expect("extend");
    assert_eq!(engine.epoch_reward(1), 500);
    assert_eq!(engine.preview_epoch_reward(3), 300);
}

#[test]
fn division_remainder_is_available_to_a_later_window() {
    let clock = ManualClock::new(GENESIS);
    let mut engine = engine_with(&clock);

    engine.fund_pool(&OPERATOR, 502).expect("fund");
    assert_eq!(engine.initialize_schedule(&OPERATOR, 5).expect("init"), 100);

    // The 2-unit remainder was never committed.
    assert_eq!(engine.extend_schedule(&OPERATOR, 1).expect("extend"), 2);
    assert_eq!(engine.preview_epoch_reward(6), 2);
}
