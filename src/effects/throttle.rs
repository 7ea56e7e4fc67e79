//! Slew-limited throttle input.
//!
//! The raw throttle ADC is noisy; a single-tick jump larger than the
//! configured step is capped to one step so the engine pitch never
//! teleports. The filtered count is then mapped linearly onto the
//! programmable rate window.

use crate::config::EngineConfig;

/// Slew-rate limiter over raw ADC counts.
///
/// Owned by the control context; one `feed` per throttle tick.
pub struct ThrottleFilter {
    smoothed: i32,
    step: i32,
}

impl ThrottleFilter {
    /// Create with the configured slew step, starting from zero throttle.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            smoothed: 0,
            step: config.adc_slew_step as i32,
        }
    }

    /// Feed one raw reading, get the slew-limited value back.
    pub fn feed(&mut self, raw: u16) -> u16 {
        let delta = raw as i32 - self.smoothed;
        if delta > self.step {
            self.smoothed += self.step;
        } else if delta < -self.step {
            self.smoothed -= self.step;
        } else {
            self.smoothed = raw as i32;
        }
        self.smoothed as u16
    }

    /// Last filtered value.
    #[inline]
    pub fn value(&self) -> u16 {
        self.smoothed as u16
    }
}

/// Map a raw ADC count onto the rate window (identity mapping: zero
/// throttle is the floor, full scale the ceiling).
pub fn adc_to_rate(config: &EngineConfig, raw: u16) -> u32 {
    let raw = raw.min(config.adc_max) as u64;
    let span = (config.rate_ceil_hz - config.rate_floor_hz) as u64;
    config.rate_floor_hz + (raw * span / config.adc_max as u64) as u32
}
