//! Top-level engine-sound facade.
//!
//! One [`EngineSound`] instance ties the playback engine, the trigger
//! inbox and the diagnostics counters together and exposes the command
//! surface (BLE dispatch, buttons, console). Commands never touch effect
//! state directly: they post into the inbox, and the effect context
//! resolves them on its next tick.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::audio::{ToneClock, TonePlayer};
use crate::config::EngineConfig;
use crate::diag::DiagCounters;
use crate::effects::inbox::{TRIG_GEAR_DOWN, TRIG_GEAR_UP, TRIG_REV_START, TRIG_REV_STOP};
use crate::effects::{EffectInbox, EngineEffects, Rejection};
use crate::logging::BG_LOG_STREAM;
use crate::rt_debug;

/// Effect status mirrored out of the effect context so command/status
/// responders can read it without touching the state machine.
struct EngineStatus {
    gear: AtomicU8,
    rev_active: AtomicBool,
    shift_active: AtomicBool,
    rate_hz: AtomicU32,
}

/// The engine-sound core.
///
/// Shared as a `static` between the ISR, the control context, the effect
/// context and the command dispatchers; every method takes `&self`.
pub struct EngineSound<C: ToneClock> {
    player: TonePlayer<C>,
    inbox: EffectInbox,
    status: EngineStatus,
    diag: DiagCounters,
}

impl<C: ToneClock> EngineSound<C> {
    /// Create a stopped engine. Call [`begin`](Self::begin) to start the
    /// sample clock.
    pub const fn new(clock: C, config: EngineConfig) -> Self {
        Self {
            player: TonePlayer::new(clock, config),
            inbox: EffectInbox::new(config.idle_rate_hz),
            status: EngineStatus {
                gear: AtomicU8::new(1),
                rev_active: AtomicBool::new(false),
                shift_active: AtomicBool::new(false),
                rate_hz: AtomicU32::new(config.idle_rate_hz),
            },
            diag: DiagCounters::new(),
        }
    }

    /// Start the sample clock at the idle rate. Idempotent.
    pub fn begin(&self) {
        self.player.begin();
    }

    /// The playback engine (ISR entry point lives here).
    #[inline]
    pub fn player(&self) -> &TonePlayer<C> {
        &self.player
    }

    /// Diagnostics counters.
    #[inline]
    pub fn diag(&self) -> &DiagCounters {
        &self.diag
    }

    /// Replace the engine recording. Returns `true` on success; a failed
    /// load is counted in diagnostics and leaves the engine silent until
    /// the next successful load.
    pub fn load_buffer(&self, bytes: &[u8]) -> bool {
        match self.player.load_bytes(bytes) {
            Ok(_) => true,
            Err(error) => {
                self.diag.record_load_failure(error.id());
                false
            }
        }
    }

    /// Rewind and unmute.
    pub fn start_playback(&self) {
        self.player.start_playback();
    }

    /// Mute and force the output to idle.
    pub fn stop_playback(&self) {
        self.player.stop_playback();
    }

    /// Set the mute flag directly. Unlike [`stop_playback`](Self::stop_playback)
    /// this does not park the output; the next tick emits idle.
    pub fn set_muted(&self, muted: bool) {
        self.player.volume().set_muted(muted);
    }

    /// Flip the mute flag; returns `true` if now muted.
    pub fn toggle_mute(&self) -> bool {
        self.player.volume().toggle_muted()
    }

    /// True while unmuted.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    /// Set the volume level (0..=100, clamped).
    pub fn set_volume(&self, level: u8) {
        self.player.volume().set_volume(level);
    }

    /// Current volume level.
    #[inline]
    pub fn volume(&self) -> u8 {
        self.player.volume().volume()
    }

    /// Publish a throttle-derived rate. Control context, every throttle
    /// tick; the effect context picks it up on its next tick.
    #[inline]
    pub fn notify_throttle(&self, rate_hz: u32) {
        self.inbox.set_throttle(rate_hz);
    }

    /// Request a rev blip.
    #[inline]
    pub fn trigger_rev_start(&self) {
        self.inbox.post_rev_start();
    }

    /// Request the end of a rev blip.
    #[inline]
    pub fn trigger_rev_stop(&self) {
        self.inbox.post_rev_stop();
    }

    /// Request an upshift.
    #[inline]
    pub fn trigger_gear_up(&self) {
        self.inbox.post_gear_up();
    }

    /// Request a downshift.
    #[inline]
    pub fn trigger_gear_down(&self) {
        self.inbox.post_gear_down();
    }

    /// Currently programmed sample rate.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.player.sample_rate()
    }

    /// Current gear as of the last effect tick.
    #[inline]
    pub fn current_gear(&self) -> u8 {
        self.status.gear.load(Ordering::Acquire)
    }

    /// True while a rev is ramping or holding, as of the last effect tick.
    #[inline]
    pub fn is_rev_active(&self) -> bool {
        self.status.rev_active.load(Ordering::Acquire)
    }

    /// True while a gear shift is in progress, as of the last effect tick.
    #[inline]
    pub fn is_shift_active(&self) -> bool {
        self.status.shift_active.load(Ordering::Acquire)
    }

    /// One tick of the effect context: drain the inbox into `fx`, advance
    /// the state machine and program the resulting rate.
    ///
    /// Pending triggers are applied in a fixed order (rev-stop, rev-start,
    /// gear-up, gear-down), so triggers posted within the same tick always
    /// resolve the same way regardless of arrival order. Returns the rate
    /// actually programmed.
    pub fn effect_tick(&self, fx: &mut EngineEffects, now_us: i64) -> u32 {
        fx.set_throttle(self.inbox.throttle());

        let bits = self.inbox.take_triggers();
        if bits & TRIG_REV_STOP != 0 {
            self.apply(fx.stop_rev(now_us), "rev stop", now_us);
        }
        if bits & TRIG_REV_START != 0 {
            self.apply(fx.start_rev(now_us), "rev start", now_us);
        }
        if bits & TRIG_GEAR_UP != 0 {
            self.apply(fx.gear_up(now_us), "gear up", now_us);
        }
        if bits & TRIG_GEAR_DOWN != 0 {
            self.apply(fx.gear_down(now_us), "gear down", now_us);
        }

        let rate = fx.tick(now_us);
        let programmed = self.player.set_sample_rate(rate);

        self.status.gear.store(fx.gear(), Ordering::Release);
        self.status.rev_active.store(fx.is_rev_active(), Ordering::Release);
        self.status.shift_active.store(fx.is_shift_active(), Ordering::Release);
        self.status.rate_hz.store(programmed, Ordering::Release);

        programmed
    }

    fn apply(&self, result: Result<(), Rejection>, what: &str, now_us: i64) {
        if let Err(rejection) = result {
            self.diag.record_rejection(rejection.id());
            rt_debug!(BG_LOG_STREAM, now_us, "{} rejected: {}", what, rejection);
        }
    }
}
