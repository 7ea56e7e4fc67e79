//! Transition curves for rev and shift ramps.
//!
//! All curves map a progress value in `[0, 1]` to `[0, 1]`. The sine is a
//! Taylor-series approximation so the curves work without a float runtime
//! in `no_std`; the argument is folded onto the quarter cycle before the
//! series, keeping the error below 4e-6 everywhere, far under one DAC
//! step.

const PI: f64 = core::f64::consts::PI;

/// Taylor-series sine, folded onto `[-π/2, π/2]` where the series
/// converges fast. Without the fold the truncation error at `x = π` is in
/// the 1e-3 range, which is audible in the shift-settle ramp.
fn sin_f64(x: f64) -> f64 {
    // Normalize to [-π, π]
    let mut x = x;
    while x > PI {
        x -= 2.0 * PI;
    }
    while x < -PI {
        x += 2.0 * PI;
    }

    // Fold onto the quarter cycle: sin(π − x) = sin(x)
    if x > PI * 0.5 {
        x = PI - x;
    } else if x < -PI * 0.5 {
        x = -PI - x;
    }

    // sin(x) = x - x³/3! + x⁵/5! - x⁷/7! + x⁹/9!
    let x2 = x * x;
    let x3 = x2 * x;
    let x5 = x3 * x2;
    let x7 = x5 * x2;
    let x9 = x7 * x2;

    x - x3 / 6.0 + x5 / 120.0 - x7 / 5040.0 + x9 / 362_880.0
}

#[inline]
fn clamp01(progress: f32) -> f64 {
    (progress as f64).clamp(0.0, 1.0)
}

/// Ease-in: `sin(p·π/2)`. Starts fast-ish, lands softly at 1.
#[inline]
pub fn ease_in(progress: f32) -> f32 {
    sin_f64(clamp01(progress) * PI * 0.5) as f32
}

/// Ease-out: `1 − sin(p·π/2)`. Starts at 1, falls away softly.
#[inline]
pub fn ease_out(progress: f32) -> f32 {
    (1.0 - sin_f64(clamp01(progress) * PI * 0.5)) as f32
}

/// Smooth step: `0.5 − 0.5·cos(p·π)`. Soft at both ends.
#[inline]
pub fn smooth(progress: f32) -> f32 {
    // cos(x) = sin(π/2 + x)
    (0.5 - 0.5 * sin_f64(PI * 0.5 + clamp01(progress) * PI)) as f32
}

/// Interpolate `from → to` along a curve value in `[0, 1]`.
#[inline]
pub fn lerp_rate(from_hz: u32, to_hz: u32, curve: f32) -> u32 {
    let value = from_hz as f32 + (to_hz as f32 - from_hz as f32) * curve;
    if value <= 0.0 {
        0
    } else {
        value as u32
    }
}
