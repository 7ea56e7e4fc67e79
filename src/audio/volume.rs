//! Volume lookup table and mute flag.
//!
//! The per-sample transform runs once per output interrupt, so all the
//! arithmetic happens up front when the volume changes: the ISR does a
//! single table index (or returns the DAC center when muted).

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use super::DAC_IDLE;

/// Effective volume is capped at 90% to keep headroom against clipping on
/// the analog side.
pub const VOLUME_HEADROOM_PCT: u8 = 90;

const fn build_table(effective_pct: u32) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut value = i as u32 * effective_pct / 100;
        if value > 255 {
            value = 255;
        }
        table[i] = value as u8;
        i += 1;
    }
    table
}

/// Volume controller: 256-entry LUT plus mute flag.
///
/// The LUT is rebuilt by control-context calls while the ISR concurrently
/// reads single entries. A read racing a rebuild sees one entry from
/// either table, which is tolerated: at most one tick plays at a stale
/// volume.
pub struct VolumeLut {
    table: UnsafeCell<[u8; 256]>,
    muted: AtomicBool,
    level: AtomicU8,
}

// SAFETY: the table is only rewritten from the control context; the ISR
// reads individual entries. Torn reads across a rebuild yield a valid
// entry from one of the two tables.
unsafe impl Sync for VolumeLut {}
unsafe impl Send for VolumeLut {}

impl VolumeLut {
    /// Create at full volume (headroom-capped), unmuted.
    pub const fn new() -> Self {
        Self {
            table: UnsafeCell::new(build_table(VOLUME_HEADROOM_PCT as u32)),
            muted: AtomicBool::new(false),
            level: AtomicU8::new(100),
        }
    }

    /// Set the volume level (0..=100, clamped) and rebuild the table.
    ///
    /// Control context only.
    pub fn set_volume(&self, level: u8) {
        let level = level.min(100);
        self.level.store(level, Ordering::Relaxed);

        let effective = level.min(VOLUME_HEADROOM_PCT) as u32;
        // SAFETY: sole writer (control context); concurrent ISR reads are
        // tolerated per the type-level contract above.
        unsafe {
            *self.table.get() = build_table(effective);
        }
    }

    /// Current volume level (0..=100).
    #[inline]
    pub fn volume(&self) -> u8 {
        self.level.load(Ordering::Relaxed)
    }

    /// Set the mute flag.
    #[inline]
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Release);
    }

    /// Flip the mute flag; returns the new state.
    #[inline]
    pub fn toggle_muted(&self) -> bool {
        !self.muted.fetch_xor(true, Ordering::AcqRel)
    }

    /// True if muted.
    #[inline]
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    /// Transform one raw sample. ISR path: branch-light, allocation-free.
    #[inline]
    pub fn process(&self, raw: u8) -> u8 {
        if self.muted.load(Ordering::Relaxed) {
            return DAC_IDLE;
        }
        // SAFETY: single-entry read; see type-level contract.
        unsafe { (*self.table.get())[raw as usize] }
    }
}

impl Default for VolumeLut {
    fn default() -> Self {
        Self::new()
    }
}
