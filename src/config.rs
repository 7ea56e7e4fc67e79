//! Module: config
//!
//! Purpose: Tunables for the engine-sound core. Every rate, duration and
//! threshold the effect machinery uses lives here; nothing is hard-coded at
//! the use site, so the historical firmware variants (different rev ceilings
//! and ramp lengths) are all reachable by configuration.
//!
//! Safety: Safe. Copy types only.

/// Engine-sound configuration.
///
/// All durations are in milliseconds, all rates in Hz. The sample rate of
/// the output clock doubles as the "engine RPM" control signal.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Lowest programmable sample rate (idle engine).
    pub rate_floor_hz: u32,

    /// Highest programmable sample rate (flat-out engine).
    pub rate_ceil_hz: u32,

    /// Rate the output clock starts at before any throttle input arrives.
    pub idle_rate_hz: u32,

    /// Rate a rev blip ramps toward and holds at.
    pub rev_ceiling_hz: u32,

    /// Ramp duration from the throttle baseline up to the rev ceiling.
    pub rev_ramp_ms: u32,

    /// Ramp duration from the rev ceiling back down to the baseline.
    pub rev_down_ms: u32,

    /// Gear-shift transient target, in percent of the throttle baseline.
    /// 130 kicks the rate 30% above baseline before settling.
    pub shift_transient_pct: u32,

    /// Duration of shift phase 0 (baseline -> transient).
    pub shift_kick_ms: u32,

    /// Duration of shift phase 1 (transient -> live throttle rate).
    pub shift_settle_ms: u32,

    /// Number of gears; the gear counter stays in `1..=max_gear`.
    pub max_gear: u8,

    /// Full-scale raw throttle ADC reading.
    pub adc_max: u16,

    /// Largest raw-count change accepted per throttle tick; bigger jumps
    /// are capped to one step (slew limiting).
    pub adc_slew_step: u16,

    /// Cadence of the throttle-sampling control context.
    pub throttle_period_ms: u32,

    /// Cadence of the effect context that advances rev/shift timers.
    pub effect_period_ms: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate_floor_hz: 8_000,
            rate_ceil_hz: 44_100,
            idle_rate_hz: 8_000,
            rev_ceiling_hz: 39_000,
            rev_ramp_ms: 300,
            rev_down_ms: 400,
            shift_transient_pct: 130,
            shift_kick_ms: 150,
            shift_settle_ms: 200,
            max_gear: 4,
            adc_max: 4095,
            adc_slew_step: 50,
            throttle_period_ms: 30,
            effect_period_ms: 1,
        }
    }
}

impl EngineConfig {
    /// Clamp a requested rate into the programmable window.
    #[inline]
    pub fn clamp_rate(&self, rate_hz: u32) -> u32 {
        rate_hz.clamp(self.rate_floor_hz, self.rate_ceil_hz)
    }

    /// Timer period in microseconds for a given (already clamped) rate.
    #[inline]
    pub fn period_us_for(&self, rate_hz: u32) -> u32 {
        1_000_000 / self.clamp_rate(rate_hz)
    }

    /// Rev ramp-up duration in microseconds.
    #[inline]
    pub fn rev_ramp_us(&self) -> i64 {
        self.rev_ramp_ms as i64 * 1_000
    }

    /// Rev ramp-down duration in microseconds.
    #[inline]
    pub fn rev_down_us(&self) -> i64 {
        self.rev_down_ms as i64 * 1_000
    }

    /// Shift phase 0 duration in microseconds.
    #[inline]
    pub fn shift_kick_us(&self) -> i64 {
        self.shift_kick_ms as i64 * 1_000
    }

    /// Shift phase 1 duration in microseconds.
    #[inline]
    pub fn shift_settle_us(&self) -> i64 {
        self.shift_settle_ms as i64 * 1_000
    }

    /// Transient target for a shift starting from `baseline_hz`, clamped
    /// into the programmable window.
    #[inline]
    pub fn shift_transient_for(&self, baseline_hz: u32) -> u32 {
        let kicked = (baseline_hz as u64 * self.shift_transient_pct as u64 / 100) as u32;
        self.clamp_rate(kicked)
    }
}
