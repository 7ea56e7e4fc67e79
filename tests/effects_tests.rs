//! Rev and gear-shift effect scenarios.

use rust_engine_tone::{EngineConfig, EngineEffects, Rejection};

const WINDOW: core::ops::RangeInclusive<u32> = 8_000..=44_100;

fn effects_at(throttle_hz: u32) -> EngineEffects {
    let mut fx = EngineEffects::new(EngineConfig::default());
    fx.set_throttle(throttle_hz);
    fx.tick(0);
    fx
}

/// Full rev cycle: ramp up, hold, ramp down, rejoin the throttle.
#[test]
fn test_full_rev_cycle() {
    let mut fx = effects_at(12_000);
    fx.start_rev(1_000_000).unwrap();

    // Ramp up: monotonic, inside the window, landing on the ceiling
    let mut last = 12_000;
    for step in 1..=30i64 {
        let rate = fx.tick(1_000_000 + step * 10_000);
        assert!(rate >= last, "ramp-up dipped at step {}", step);
        assert!(WINDOW.contains(&rate));
        last = rate;
    }
    assert_eq!(last, 39_000);

    // Hold until the stop trigger, however late it is
    assert_eq!(fx.tick(3_000_000), 39_000);
    assert!(fx.is_rev_active());

    fx.stop_rev(3_000_000).unwrap();

    // Ramp down: monotonic the other way
    let mut last = 39_000;
    for step in 1..=40i64 {
        let rate = fx.tick(3_000_000 + step * 10_000);
        assert!(rate <= last, "ramp-down rose at step {}", step);
        assert!(WINDOW.contains(&rate));
        last = rate;
    }
    assert_eq!(last, 12_000);
    assert!(!fx.is_rev_active());

    // Back to throttle-follow
    fx.set_throttle(18_000);
    assert_eq!(fx.tick(3_500_000), 18_000);
}

/// Shift through all gears up and back down, honoring the limits.
#[test]
fn test_shift_through_all_gears() {
    let config = EngineConfig::default();
    let shift_us = config.shift_kick_us() + config.shift_settle_us();
    let mut fx = effects_at(16_000);
    let mut now = 0i64;

    for expected in 2..=4u8 {
        fx.gear_up(now).unwrap();
        assert_eq!(fx.gear(), expected);
        now += shift_us;
        fx.tick(now);
    }
    assert_eq!(fx.gear_up(now), Err(Rejection::GearAtLimit));

    for expected in (1..=3u8).rev() {
        fx.gear_down(now).unwrap();
        assert_eq!(fx.gear(), expected);
        now += shift_us;
        fx.tick(now);
    }
    assert_eq!(fx.gear_down(now), Err(Rejection::GearAtLimit));
    assert_eq!(fx.gear(), 1);
}

/// The shift transient rises above the baseline, then the settle phase
/// lands on the throttle as it is *now*, not as it was at the trigger.
#[test]
fn test_shift_rejoins_moving_throttle() {
    let config = EngineConfig::default();
    let mut fx = effects_at(20_000);

    fx.gear_up(0).unwrap();

    // End of the kick phase: at the 130% transient
    let kicked = fx.tick(config.shift_kick_us());
    assert_eq!(kicked, 26_000);

    // Driver keeps accelerating during the settle
    fx.set_throttle(30_000);
    let done = config.shift_kick_us() + config.shift_settle_us();
    assert_eq!(fx.tick(done), 30_000);
    assert!(!fx.is_shift_active());
}

/// A rev triggered at full throttle still converges on the rev ceiling,
/// never leaving the rate window.
#[test]
fn test_rev_from_full_throttle() {
    let mut fx = effects_at(44_100);
    fx.start_rev(0).unwrap();

    for step in 0..=30i64 {
        let rate = fx.tick(step * 10_000);
        assert!(WINDOW.contains(&rate));
    }
    assert_eq!(fx.tick(300_000), 39_000);
}

/// Rev and shift exclude each other in both directions.
#[test]
fn test_rev_and_shift_mutual_exclusion() {
    let mut fx = effects_at(10_000);

    fx.start_rev(0).unwrap();
    assert_eq!(fx.gear_up(1_000), Err(Rejection::RevBlocksShift));
    assert_eq!(fx.gear_down(1_000), Err(Rejection::RevBlocksShift));

    fx.stop_rev(300_000).unwrap();
    assert_eq!(fx.gear_up(310_000), Err(Rejection::RevBlocksShift));

    // Once the ramp-down is over, shifting works again
    fx.tick(800_000);
    fx.gear_up(800_000).unwrap();
    assert_eq!(fx.start_rev(801_000), Err(Rejection::ShiftBlocksRev));
}

/// Throttle updates during a rev change nothing until the rev resolves.
#[test]
fn test_throttle_ignored_while_revving() {
    let mut fx = effects_at(10_000);
    fx.start_rev(0).unwrap();
    fx.tick(300_000);

    fx.set_throttle(25_000);
    assert_eq!(fx.tick(400_000), 39_000);

    // The ramp-down still targets the baseline captured at rev entry;
    // the new throttle takes over only after Idle is reached.
    fx.stop_rev(400_000).unwrap();
    assert_eq!(fx.tick(400_000 + 400_000), 25_000);
}
