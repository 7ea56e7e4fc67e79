//! Trigger mailbox between the command/control contexts and the effect
//! context.
//!
//! Producers (BLE dispatch, buttons, throttle sampler) post events with
//! plain atomic stores and never touch effect state; the single effect
//! context drains the mailbox once per tick and applies the events in a
//! fixed order, so a rev and a gear shift arriving in the same instant
//! always resolve the same way. No callbacks, no locks.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Rev-start was requested.
pub const TRIG_REV_START: u8 = 0x01;

/// Rev-stop was requested.
pub const TRIG_REV_STOP: u8 = 0x02;

/// Gear-up was requested.
pub const TRIG_GEAR_UP: u8 = 0x04;

/// Gear-down was requested.
pub const TRIG_GEAR_DOWN: u8 = 0x08;

/// Atomic trigger mailbox plus the live throttle rate.
///
/// Duplicate posts within one effect tick coalesce into a single bit,
/// which matches the trigger semantics (a second rev-start is a no-op
/// anyway).
pub struct EffectInbox {
    triggers: AtomicU8,
    throttle_hz: AtomicU32,
}

impl EffectInbox {
    /// Create an empty inbox with the given initial throttle rate.
    pub const fn new(idle_rate_hz: u32) -> Self {
        Self {
            triggers: AtomicU8::new(0),
            throttle_hz: AtomicU32::new(idle_rate_hz),
        }
    }

    /// Publish the throttle-derived rate (control context, every tick).
    #[inline]
    pub fn set_throttle(&self, rate_hz: u32) {
        self.throttle_hz.store(rate_hz, Ordering::Release);
    }

    /// Latest throttle-derived rate.
    #[inline]
    pub fn throttle(&self) -> u32 {
        self.throttle_hz.load(Ordering::Acquire)
    }

    /// Post a rev-start request.
    #[inline]
    pub fn post_rev_start(&self) {
        self.triggers.fetch_or(TRIG_REV_START, Ordering::AcqRel);
    }

    /// Post a rev-stop request.
    #[inline]
    pub fn post_rev_stop(&self) {
        self.triggers.fetch_or(TRIG_REV_STOP, Ordering::AcqRel);
    }

    /// Post a gear-up request.
    #[inline]
    pub fn post_gear_up(&self) {
        self.triggers.fetch_or(TRIG_GEAR_UP, Ordering::AcqRel);
    }

    /// Post a gear-down request.
    #[inline]
    pub fn post_gear_down(&self) {
        self.triggers.fetch_or(TRIG_GEAR_DOWN, Ordering::AcqRel);
    }

    /// Atomically take all pending trigger bits, clearing the mailbox.
    ///
    /// Effect context only, once per tick.
    #[inline]
    pub fn take_triggers(&self) -> u8 {
        self.triggers.swap(0, Ordering::AcqRel)
    }
}
