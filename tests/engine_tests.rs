//! Whole-core integration: command surface, effect ticks and the ISR
//! running against one engine instance.

use std::sync::{Arc, Mutex};
use std::thread;

use rust_engine_tone::{
    EngineConfig, EngineEffects, EngineSound, Rejection, ToneClock, DAC_IDLE,
};

/// Clock that records DAC writes and the last programmed period.
#[derive(Clone, Default)]
struct MockClock {
    writes: Arc<Mutex<Vec<u8>>>,
    period_us: Arc<Mutex<u32>>,
}

impl MockClock {
    fn writes(&self) -> Vec<u8> {
        self.writes.lock().unwrap().clone()
    }

    fn period_us(&self) -> u32 {
        *self.period_us.lock().unwrap()
    }
}

impl ToneClock for MockClock {
    fn start(&self, period_us: u32) {
        *self.period_us.lock().unwrap() = period_us;
    }
    fn set_period_us(&self, period_us: u32) {
        *self.period_us.lock().unwrap() = period_us;
    }
    fn pause(&self) {}
    fn resume(&self) {}
    fn write(&self, sample: u8) {
        self.writes.lock().unwrap().push(sample);
    }
}

fn engine() -> (EngineSound<MockClock>, MockClock) {
    let clock = MockClock::default();
    let engine = EngineSound::new(clock.clone(), EngineConfig::default());
    engine.begin();
    (engine, clock)
}

/// Drive the whole pipeline: load, play, throttle up, shift, rev.
#[test]
fn test_pipeline_end_to_end() {
    let (engine, clock) = engine();
    let mut fx = EngineEffects::new(EngineConfig::default());

    assert!(engine.load_buffer(&[0, 255, 128, 64, 192]));
    engine.start_playback();

    // Throttle up: the next effect tick reprograms the period
    engine.notify_throttle(20_000);
    assert_eq!(engine.effect_tick(&mut fx, 0), 20_000);
    assert_eq!(clock.period_us(), 50);

    // The ISR keeps replaying samples at whatever rate is programmed
    let before = clock.writes().len();
    for _ in 0..10 {
        engine.player().isr_tick();
    }
    let writes = clock.writes();
    assert_eq!(writes.len(), before + 10);
    assert!(writes[before..].iter().all(|&sample| sample != DAC_IDLE));

    // Upshift: transient first, live throttle afterwards
    engine.trigger_gear_up();
    engine.effect_tick(&mut fx, 1_000);
    assert!(engine.is_shift_active());
    assert_eq!(engine.current_gear(), 2);
    assert!(engine.sample_rate() >= 20_000);

    let config = EngineConfig::default();
    let done = 1_000 + config.shift_kick_us() + config.shift_settle_us();
    engine.effect_tick(&mut fx, done);
    assert!(!engine.is_shift_active());
    assert_eq!(engine.sample_rate(), 20_000);

    // Rev blip: rate pinned to the ceiling while held
    engine.trigger_rev_start();
    engine.effect_tick(&mut fx, done + 1_000);
    assert!(engine.is_rev_active());
    engine.effect_tick(&mut fx, done + 1_000 + config.rev_ramp_us());
    assert_eq!(engine.sample_rate(), 39_000);
    assert_eq!(clock.period_us(), 1_000_000 / 39_000);

    engine.trigger_rev_stop();
    engine.effect_tick(&mut fx, done + 500_000);
    engine.effect_tick(&mut fx, done + 500_000 + config.rev_down_us());
    assert!(!engine.is_rev_active());
    assert_eq!(engine.sample_rate(), 20_000);
}

/// Triggers posted between ticks resolve in one deterministic batch.
#[test]
fn test_trigger_batch_resolution() {
    let (engine, _clock) = engine();
    let mut fx = EngineEffects::new(EngineConfig::default());
    engine.notify_throttle(10_000);
    engine.effect_tick(&mut fx, 0);

    // Stop-then-start posted together: the stop is a no-op (nothing
    // revving), the start wins.
    engine.trigger_rev_stop();
    engine.trigger_rev_start();
    engine.effect_tick(&mut fx, 1_000);

    assert!(engine.is_rev_active());
    assert_eq!(engine.diag().rejected_triggers(), 1);
    assert_eq!(engine.diag().last_rejection(), Rejection::NotRevving.id());
}

/// Rejections accumulate in diagnostics without disturbing playback.
#[test]
fn test_rejections_leave_playback_running() {
    let (engine, _clock) = engine();
    let mut fx = EngineEffects::new(EngineConfig::default());
    engine.notify_throttle(10_000);
    engine.effect_tick(&mut fx, 0);
    assert!(engine.load_buffer(&[1, 2, 3, 200]));
    engine.start_playback();

    engine.trigger_gear_down(); // at gear 1 already
    engine.effect_tick(&mut fx, 1_000);
    assert_eq!(engine.diag().last_rejection(), Rejection::GearAtLimit.id());
    assert_eq!(engine.current_gear(), 1);

    assert!(engine.is_playing());
    assert_eq!(engine.sample_rate(), 10_000);
}

/// Producer threads hammer the command surface while the effect context
/// ticks; the core never leaves its invariants.
#[test]
fn test_concurrent_commands_hold_invariants() {
    let (engine, _clock) = engine();
    let engine = Arc::new(engine);

    let producer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0u32..2_000 {
                engine.notify_throttle(8_000 + (i % 37) * 1_000);
                match i % 53 {
                    0 => engine.trigger_rev_start(),
                    13 => engine.trigger_rev_stop(),
                    27 => engine.trigger_gear_up(),
                    41 => engine.trigger_gear_down(),
                    _ => {}
                }
            }
        })
    };

    let mut fx = EngineEffects::new(EngineConfig::default());
    for tick in 0i64..4_000 {
        let rate = engine.effect_tick(&mut fx, tick * 1_000);
        assert!((8_000..=44_100).contains(&rate), "rate {} out of window", rate);
        assert!((1..=4).contains(&engine.current_gear()));
        assert!(!(engine.is_rev_active() && engine.is_shift_active()));
    }

    producer.join().unwrap();
}
