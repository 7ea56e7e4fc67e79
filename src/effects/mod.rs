//! Engine RPM effect state machine.
//!
//! Pure logic, no hardware dependencies. Consumes throttle input and
//! rev/shift triggers, produces the target sample rate. Fully testable on
//! host.
//!
//! # States
//!
//! - **Idle**: the rate follows the throttle-derived rate directly.
//! - **Revving**: eases from the throttle baseline up to the rev ceiling,
//!   then holds until a stop trigger.
//! - **RevDown**: eases from the ceiling back to the baseline captured at
//!   rev entry, then returns to Idle.
//! - **Shifting**: two timed phases — a kick up to a transient above the
//!   baseline, then a settle onto the *live* throttle rate, so the sound
//!   rejoins the driver's current input instead of snapping.
//!
//! Rev (either direction) blocks shift triggers; shift blocks rev
//! triggers. All curves are deterministic functions of elapsed time since
//! state entry, recomputed every tick: a delayed tick self-corrects
//! instead of drifting.

pub mod curve;
pub mod inbox;
pub mod throttle;

pub use inbox::EffectInbox;
pub use throttle::{adc_to_rate, ThrottleFilter};

use crate::config::EngineConfig;
use curve::{ease_in, ease_out, lerp_rate, smooth};

/// Why a trigger was not applied. Boundary conditions, not failures: the
/// state machine is unchanged and playback continues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Rev-start while a rev is already running.
    AlreadyRevving,
    /// Rev-stop without a rev running.
    NotRevving,
    /// Rev-start during a gear shift.
    ShiftBlocksRev,
    /// Gear trigger during a rev or rev-down.
    RevBlocksShift,
    /// Gear trigger while a shift is still settling.
    ShiftInProgress,
    /// Gear already at its floor/ceiling.
    GearAtLimit,
}

impl Rejection {
    /// Stable numeric id for diagnostics counters (0 is reserved for
    /// "none").
    pub const fn id(&self) -> u8 {
        match self {
            Self::AlreadyRevving => 1,
            Self::NotRevving => 2,
            Self::ShiftBlocksRev => 3,
            Self::RevBlocksShift => 4,
            Self::ShiftInProgress => 5,
            Self::GearAtLimit => 6,
        }
    }

    /// Short reason string for log lines.
    pub const fn message(&self) -> &'static str {
        match self {
            Self::AlreadyRevving => "already revving",
            Self::NotRevving => "not revving",
            Self::ShiftBlocksRev => "shift in progress blocks rev",
            Self::RevBlocksShift => "rev in progress blocks shift",
            Self::ShiftInProgress => "shift already in progress",
            Self::GearAtLimit => "gear at limit",
        }
    }
}

impl core::fmt::Display for Rejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// FSM state. Each timed state carries its entry timestamp and the rate
/// captured at entry; everything else is recomputed per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Revving { entered_us: i64, baseline_hz: u32 },
    RevDown { entered_us: i64, baseline_hz: u32 },
    Shifting { entered_us: i64, baseline_hz: u32, transient_hz: u32 },
}

/// The effect state machine.
///
/// Owned by the effect context; one [`tick`](Self::tick) per control
/// period pushes the result into the playback engine.
pub struct EngineEffects {
    config: EngineConfig,
    state: State,

    /// Live throttle-derived rate, updated every tick from the inbox.
    throttle_hz: u32,

    /// Rate computed by the most recent tick.
    rate_hz: u32,

    /// Current gear, `1..=max_gear`. Mutated only by accepted shift
    /// triggers.
    gear: u8,
}

impl EngineEffects {
    /// Create in Idle at the configured idle rate, gear 1.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: State::Idle,
            throttle_hz: config.idle_rate_hz,
            rate_hz: config.idle_rate_hz,
            gear: 1,
        }
    }

    /// Update the live throttle-derived rate (clamped).
    pub fn set_throttle(&mut self, rate_hz: u32) {
        self.throttle_hz = self.config.clamp_rate(rate_hz);
    }

    /// Advance the machine to `now_us` and return the target rate.
    ///
    /// Timed phases that have elapsed resolve to completion here; a
    /// skipped tick lands on the same rate a punctual one would have.
    pub fn tick(&mut self, now_us: i64) -> u32 {
        let rate = match self.state {
            State::Idle => self.throttle_hz,

            State::Revving { entered_us, baseline_hz } => {
                let elapsed = now_us - entered_us;
                let ramp = self.config.rev_ramp_us();
                if elapsed >= ramp {
                    self.config.rev_ceiling_hz
                } else {
                    let progress = elapsed as f32 / ramp as f32;
                    lerp_rate(baseline_hz, self.config.rev_ceiling_hz, ease_in(progress))
                }
            }

            State::RevDown { entered_us, baseline_hz } => {
                let elapsed = now_us - entered_us;
                let down = self.config.rev_down_us();
                if elapsed >= down {
                    // Ramp-down finished; the baseline is discarded.
                    self.state = State::Idle;
                    self.throttle_hz
                } else {
                    let progress = elapsed as f32 / down as f32;
                    lerp_rate(baseline_hz, self.config.rev_ceiling_hz, ease_out(progress))
                }
            }

            State::Shifting { entered_us, baseline_hz, transient_hz } => {
                let elapsed = now_us - entered_us;
                let kick = self.config.shift_kick_us();
                let settle = self.config.shift_settle_us();
                if elapsed < kick {
                    let progress = elapsed as f32 / kick as f32;
                    lerp_rate(baseline_hz, transient_hz, ease_in(progress))
                } else if elapsed < kick + settle {
                    // Settle onto the live throttle rate, re-read every
                    // tick, not the stale baseline.
                    let progress = (elapsed - kick) as f32 / settle as f32;
                    lerp_rate(transient_hz, self.throttle_hz, smooth(progress))
                } else {
                    self.state = State::Idle;
                    self.throttle_hz
                }
            }
        };

        self.rate_hz = self.config.clamp_rate(rate);
        self.rate_hz
    }

    /// Start a rev blip. Allowed from Idle and RevDown; a second start
    /// while revving is a no-op, and shifts block revs.
    pub fn start_rev(&mut self, now_us: i64) -> Result<(), Rejection> {
        match self.state {
            State::Revving { .. } => Err(Rejection::AlreadyRevving),
            State::Shifting { .. } => Err(Rejection::ShiftBlocksRev),
            State::Idle | State::RevDown { .. } => {
                self.state = State::Revving {
                    entered_us: now_us,
                    baseline_hz: self.throttle_hz,
                };
                Ok(())
            }
        }
    }

    /// Stop a running rev, beginning the ramp back down to the baseline
    /// captured at rev entry. A stop without a rev running is a no-op.
    pub fn stop_rev(&mut self, now_us: i64) -> Result<(), Rejection> {
        match self.state {
            State::Revving { baseline_hz, .. } => {
                self.state = State::RevDown {
                    entered_us: now_us,
                    baseline_hz,
                };
                Ok(())
            }
            _ => Err(Rejection::NotRevving),
        }
    }

    /// Shift up a gear.
    pub fn gear_up(&mut self, now_us: i64) -> Result<(), Rejection> {
        self.check_shift_allowed()?;
        if self.gear >= self.config.max_gear {
            return Err(Rejection::GearAtLimit);
        }
        self.gear += 1;
        self.enter_shift(now_us);
        Ok(())
    }

    /// Shift down a gear.
    pub fn gear_down(&mut self, now_us: i64) -> Result<(), Rejection> {
        self.check_shift_allowed()?;
        if self.gear <= 1 {
            return Err(Rejection::GearAtLimit);
        }
        self.gear -= 1;
        self.enter_shift(now_us);
        Ok(())
    }

    fn check_shift_allowed(&self) -> Result<(), Rejection> {
        match self.state {
            State::Revving { .. } | State::RevDown { .. } => Err(Rejection::RevBlocksShift),
            State::Shifting { .. } => Err(Rejection::ShiftInProgress),
            State::Idle => Ok(()),
        }
    }

    fn enter_shift(&mut self, now_us: i64) {
        let baseline_hz = self.throttle_hz;
        self.state = State::Shifting {
            entered_us: now_us,
            baseline_hz,
            transient_hz: self.config.shift_transient_for(baseline_hz),
        };
    }

    /// True while a rev is ramping up, holding, or ramping down.
    #[inline]
    pub fn is_rev_active(&self) -> bool {
        matches!(self.state, State::Revving { .. } | State::RevDown { .. })
    }

    /// True while a gear shift is kicking or settling.
    #[inline]
    pub fn is_shift_active(&self) -> bool {
        matches!(self.state, State::Shifting { .. })
    }

    /// Current gear.
    #[inline]
    pub fn gear(&self) -> u8 {
        self.gear
    }

    /// Rate computed by the most recent tick.
    #[inline]
    pub fn rate(&self) -> u32 {
        self.rate_hz
    }

    /// Live throttle-derived rate.
    #[inline]
    pub fn throttle(&self) -> u32 {
        self.throttle_hz
    }

    /// Drop any in-flight effect and return to throttle-follow. The gear
    /// counter is preserved.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.rate_hz = self.throttle_hz;
    }
}
