//! Interrupt-driven playback engine.
//!
//! Owns the hardware sample clock (behind the [`ToneClock`] seam), the
//! loaded PCM buffer and the read cursor. Concurrency follows a static
//! ownership partition instead of a lock:
//!
//! - the ISR alone mutates the cursor (every tick),
//! - the control contexts alone mutate the rate and swap the buffer, and
//!   the buffer is only ever swapped while the clock is paused.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::{LoadError, PcmBuffer, VolumeLut, DAC_IDLE};
use crate::config::EngineConfig;

/// Hardware seam for the periodic sample clock and the analog output.
///
/// Implemented by the espidf GPTimer/DAC pair in `hal`, and by mocks in
/// the test suite. All methods take `&self`: the implementation is shared
/// between the ISR and the control contexts.
pub trait ToneClock {
    /// Configure the periodic interrupt and start it.
    fn start(&self, period_us: u32);

    /// Reprogram the interrupt period. Only called when the rate actually
    /// changed.
    fn set_period_us(&self, period_us: u32);

    /// Stop the interrupt from firing (buffer swap in progress).
    fn pause(&self);

    /// Let the interrupt fire again.
    fn resume(&self);

    /// Emit one sample on the analog output.
    fn write(&self, sample: u8);
}

/// The playback engine.
///
/// `Sync`: see the ownership partition in the module docs.
pub struct TonePlayer<C: ToneClock> {
    clock: C,
    volume: VolumeLut,
    config: EngineConfig,

    /// Swapped only while the clock is paused.
    buffer: UnsafeCell<PcmBuffer>,

    /// Published length of `buffer`; 0 means no recording loaded. Written
    /// after the buffer contents are in place (Release), read by the ISR
    /// first (Acquire).
    len: AtomicU32,

    /// Read cursor, ISR-owned. The only control-context write is the reset
    /// to 0 in `start_playback`, which at worst races one tick.
    cursor: AtomicU32,

    /// Currently programmed sample rate.
    rate: AtomicU32,

    started: AtomicBool,
}

// SAFETY: `buffer` is mutated only while the clock is paused (no ISR
// running) and only from one control context; the ISR otherwise reads it
// behind the Acquire-load of `len`. All other fields are atomics.
unsafe impl<C: ToneClock + Sync> Sync for TonePlayer<C> {}
unsafe impl<C: ToneClock + Send> Send for TonePlayer<C> {}

impl<C: ToneClock> TonePlayer<C> {
    /// Create a stopped player. Call [`begin`](Self::begin) to start the
    /// clock.
    pub const fn new(clock: C, config: EngineConfig) -> Self {
        Self {
            clock,
            volume: VolumeLut::new(),
            config,
            buffer: UnsafeCell::new(PcmBuffer::new()),
            len: AtomicU32::new(0),
            cursor: AtomicU32::new(0),
            rate: AtomicU32::new(config.idle_rate_hz),
            started: AtomicBool::new(false),
        }
    }

    /// Start the sample clock at the idle rate. Idempotent.
    pub fn begin(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        self.clock.write(DAC_IDLE);
        self.rate.store(self.config.idle_rate_hz, Ordering::Release);
        self.clock.start(self.config.period_us_for(self.config.idle_rate_hz));
    }

    /// Clamp `rate_hz` into the programmable window and reprogram the
    /// interrupt period — but only if the rate actually changed, since
    /// reprogramming itself costs an interrupt-disable/enable cycle.
    ///
    /// Control/effect context only; callers serialize their own calls.
    /// Returns the rate actually programmed.
    pub fn set_sample_rate(&self, rate_hz: u32) -> u32 {
        let rate = self.config.clamp_rate(rate_hz);
        if rate != self.rate.load(Ordering::Relaxed) {
            self.clock.set_period_us(1_000_000 / rate);
            self.rate.store(rate, Ordering::Release);
        }
        rate
    }

    /// Currently programmed sample rate.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.rate.load(Ordering::Acquire)
    }

    /// Rewind to the start of the recording and unmute.
    pub fn start_playback(&self) {
        self.cursor.store(0, Ordering::Relaxed);
        self.volume.set_muted(false);
    }

    /// Mute and force the analog output to idle immediately, without
    /// waiting for the next interrupt tick.
    pub fn stop_playback(&self) {
        self.volume.set_muted(true);
        self.clock.write(DAC_IDLE);
    }

    /// True while unmuted.
    #[inline]
    pub fn is_playing(&self) -> bool {
        !self.volume.is_muted()
    }

    /// The volume controller (shared with the ISR).
    #[inline]
    pub fn volume(&self) -> &VolumeLut {
        &self.volume
    }

    /// Replace the recording with a normalized copy of `bytes`.
    ///
    /// The clock is paused for the duration of the swap and resumed
    /// unconditionally afterward, also on failure — a failed load leaves
    /// the player silent at idle, never reading a half-replaced buffer.
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<u32, LoadError> {
        self.clock.pause();
        let result = self.swap_buffer(bytes);
        self.clock.resume();
        result
    }

    fn swap_buffer(&self, bytes: &[u8]) -> Result<u32, LoadError> {
        // Unpublish before touching the buffer: if we fail past this
        // point, the ISR sees an empty player and emits idle.
        self.len.store(0, Ordering::Release);

        // SAFETY: clock paused, so no ISR read is in flight; this is the
        // only context that swaps buffers.
        let buffer = unsafe { &mut *self.buffer.get() };
        let length = buffer.load_bytes(bytes)?;

        self.cursor.store(0, Ordering::Relaxed);
        self.len.store(length, Ordering::Release);
        Ok(length)
    }

    /// One tick of the interrupt handler: bounded time, no locking, no
    /// allocation, no logging.
    #[inline]
    pub fn isr_tick(&self) {
        let length = self.len.load(Ordering::Acquire);
        if length == 0 || self.volume.is_muted() {
            self.clock.write(DAC_IDLE);
            return;
        }

        let mut cursor = self.cursor.load(Ordering::Relaxed);
        if cursor >= length {
            cursor = 0;
        }

        // SAFETY: `len > 0` was published after the buffer contents
        // (Release/Acquire pair) and the buffer is never swapped while
        // the clock runs; `cursor < length` after the wrap above.
        let raw = unsafe { (*self.buffer.get()).as_slice()[cursor as usize] };

        self.clock.write(self.volume.process(raw));
        self.cursor.store(cursor + 1, Ordering::Relaxed);
    }
}
