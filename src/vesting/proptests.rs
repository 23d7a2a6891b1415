// Property tests for the quantified invariants: release monotonicity,
// aggregate coherence, solvency, and at-most-one claim per fingerprint.

use primitive_types::U256;
use proptest::prelude::*;

use crate::{
    config::{MAX_START_DELAY, MAX_VESTING_DURATION, MIN_VESTING_DURATION},
    crypto::Address,
    testing::{ManualClock, MemoryToken},
    vesting::engine::{EngineConfig, VestingEngine},
};

use super::{
    math,
    schedule::{schedule_id, Schedule, ScheduleParams},
};

const NOW: u64 = 1_700_000_000;

fn addr(tag: u8) -> Address {
    Address::new([tag; 32])
}

fn arb_params() -> impl Strategy<Value = ScheduleParams> {
    (
        NOW..NOW + MAX_START_DELAY,
        MIN_VESTING_DURATION..=MAX_VESTING_DURATION,
        1u64..=60,
        any::<bool>(),
        1u128..=u128::MAX,
    )
        .prop_flat_map(|(start, duration, slice_seconds, revokable, amount)| {
            (0u64..=duration).prop_map(move |cliff_offset| ScheduleParams {
                start,
                cliff_offset,
                duration,
                slice_seconds,
                revokable,
                amount: U256::from(amount),
            })
        })
}

#[derive(Debug, Clone)]
enum Op {
    Create { tag: u8, amount: u64, duration: u64 },
    Advance { seconds: u64 },
    Release { tag: u8, index: u64, amount: u64 },
    ReleaseAll { tag: u8 },
    Revoke { tag: u8, index: u64 },
    Withdraw { amount: u64 },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u8..=3, 1u64..1_000, MIN_VESTING_DURATION..4 * MIN_VESTING_DURATION)
            .prop_map(|(tag, amount, duration)| Op::Create {
                tag,
                amount,
                duration
            }),
        (0u64..8 * MIN_VESTING_DURATION).prop_map(|seconds| Op::Advance { seconds }),
        (1u8..=3, 0u64..4, 1u64..1_000).prop_map(|(tag, index, amount)| Op::Release {
            tag,
            index,
            amount
        }),
        (1u8..=3).prop_map(|tag| Op::ReleaseAll { tag }),
        (1u8..=3, 0u64..4).prop_map(|(tag, index)| Op::Revoke { tag, index }),
        (0u64..2_000).prop_map(|amount| Op::Withdraw { amount }),
    ]
}

proptest! {
    /// releasable is monotone non-decreasing in `now` for a fixed schedule
    #[test]
    fn prop_releasable_monotone(
        params in arb_params(),
        a in 0u64..2 * MAX_VESTING_DURATION,
        b in 0u64..2 * MAX_VESTING_DURATION,
    ) {
        let schedule = Schedule::new(addr(1), &params);
        let (early, late) = if a <= b { (a, b) } else { (b, a) };
        let at_early = math::releasable(&schedule, params.start.saturating_add(early));
        let at_late = math::releasable(&schedule, params.start.saturating_add(late));
        prop_assert!(at_early <= at_late);
    }

    /// vested never exceeds the committed principal
    #[test]
    fn prop_releasable_bounded_by_total(
        params in arb_params(),
        offset in 0u64..2 * MAX_VESTING_DURATION,
    ) {
        let schedule = Schedule::new(addr(1), &params);
        let due = math::releasable(&schedule, params.start.saturating_add(offset));
        prop_assert!(due <= params.amount);
    }

    /// After every operation the engine stays solvent and its aggregates
    /// stay coherent with the per-schedule state
    #[test]
    fn prop_engine_invariants_hold(ops in proptest::collection::vec(arb_op(), 1..24)) {
        let admin = addr(0xA0);
        let treasury = U256::from(1_000_000u64);
        let token = MemoryToken::new(treasury);
        let clock = ManualClock::new(NOW);
        let mut engine = VestingEngine::new(
            EngineConfig {
                name: "Vested Token".to_string(),
                symbol: "vTKN".to_string(),
                admin,
                vesting_creator: admin,
                gate: None,
            },
            Box::new(token.clone()),
            None,
            Box::new(clock.clone()),
        )
        .expect("engine construction");

        let mut now = NOW;
        for op in ops {
            // Individual operations may legitimately fail (insolvency,
            // revoked schedules, empty indices); the invariants must hold
            // either way
            match op {
                Op::Create { tag, amount, duration } => {
                    let _ = engine.create(
                        &admin,
                        &addr(tag),
                        &ScheduleParams {
                            start: now,
                            cliff_offset: 0,
                            duration,
                            slice_seconds: 1,
                            revokable: true,
                            amount: U256::from(amount),
                        },
                    );
                }
                Op::Advance { seconds } => {
                    now += seconds;
                    clock.set(now);
                }
                Op::Release { tag, index, amount } => {
                    let id = schedule_id(&addr(tag), index);
                    let _ = engine.release(&addr(tag), &id, U256::from(amount));
                }
                Op::ReleaseAll { tag } => {
                    let _ = engine.release_all(&addr(tag), &addr(tag));
                }
                Op::Revoke { tag, index } => {
                    let id = schedule_id(&addr(tag), index);
                    let _ = engine.revoke(&admin, &id);
                }
                Op::Withdraw { amount } => {
                    let _ = engine.withdraw(&admin, U256::from(amount));
                }
            }

            prop_assert!(engine.state().store.aggregates_consistent());
            prop_assert!(token.treasury() >= engine.total_supply());

            let by_beneficiary: U256 = (1u8..=3)
                .map(|tag| engine.balance_of(&addr(tag)))
                .fold(U256::zero(), |acc, v| acc + v);
            prop_assert_eq!(engine.total_supply(), by_beneficiary);
        }
    }
}
