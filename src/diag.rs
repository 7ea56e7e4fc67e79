//! Diagnostics counters for boundary conditions.
//!
//! A rejected trigger (gear at its limit, rev while shifting) is a no-op,
//! not a failure: nothing in this core ever latches a fault or stops the
//! output. The counters here just make the no-ops visible to telemetry
//! collaborators.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Thread-safe diagnostics state.
///
/// Written from the effect context (rejections) and whichever context
/// drives buffer loads; read by status responders at leisure.
pub struct DiagCounters {
    /// Triggers rejected by the effect state machine since boot.
    rejected_triggers: AtomicU32,

    /// Reason code of the most recent rejection (see [`Rejection::id`]).
    ///
    /// [`Rejection::id`]: crate::effects::Rejection::id
    last_rejection: AtomicU8,

    /// Failed buffer loads since boot.
    load_failures: AtomicU32,

    /// Error code of the most recent failed load (see [`LoadError::id`]).
    ///
    /// [`LoadError::id`]: crate::audio::LoadError::id
    last_load_error: AtomicU8,
}

impl DiagCounters {
    /// Create zeroed counters.
    pub const fn new() -> Self {
        Self {
            rejected_triggers: AtomicU32::new(0),
            last_rejection: AtomicU8::new(0),
            load_failures: AtomicU32::new(0),
            last_load_error: AtomicU8::new(0),
        }
    }

    /// Record a rejected trigger.
    #[inline]
    pub fn record_rejection(&self, reason_id: u8) {
        self.last_rejection.store(reason_id, Ordering::Release);
        self.rejected_triggers.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed buffer load.
    #[inline]
    pub fn record_load_failure(&self, error_id: u8) {
        self.last_load_error.store(error_id, Ordering::Release);
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Rejected-trigger count since boot.
    #[inline]
    pub fn rejected_triggers(&self) -> u32 {
        self.rejected_triggers.load(Ordering::Relaxed)
    }

    /// Reason id of the most recent rejection (0 = none yet).
    #[inline]
    pub fn last_rejection(&self) -> u8 {
        self.last_rejection.load(Ordering::Acquire)
    }

    /// Failed-load count since boot.
    #[inline]
    pub fn load_failures(&self) -> u32 {
        self.load_failures.load(Ordering::Relaxed)
    }

    /// Error id of the most recent failed load (0 = none yet).
    #[inline]
    pub fn last_load_error(&self) -> u8 {
        self.last_load_error.load(Ordering::Acquire)
    }
}

impl Default for DiagCounters {
    fn default() -> Self {
        Self::new()
    }
}
