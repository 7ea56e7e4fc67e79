//! # EngineTone
//!
//! Simulated combustion-engine soundtrack for ESP32.
//!
//! A looping 8-bit PCM recording is replayed through the on-chip DAC from a
//! hardware timer interrupt; the playback rate is continuously re-tuned to
//! emulate engine RPM, rev blips and gear shifts.
//!
//! ## Architecture
//!
//! - Pure logic lives in this library and is fully host-testable; hardware
//!   sits behind the [`ToneClock`] seam (`hal` on espidf, mocks in tests).
//! - The timer ISR and the control contexts share state through disjoint
//!   ownership: the ISR alone advances the read cursor, the effect context
//!   alone programs the rate. No mutexes anywhere.
//! - Triggers (rev, gear shift) are posted to an atomic inbox and applied by
//!   the single effect context, so simultaneous events resolve
//!   deterministically.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod audio;
pub mod config;
pub mod diag;
pub mod effects;
pub mod engine;
pub mod logging;

#[cfg(target_os = "espidf")]
pub mod hal;

pub use audio::{LoadError, PcmBuffer, ToneClock, TonePlayer, VolumeLut, DAC_IDLE};
pub use config::EngineConfig;
pub use diag::DiagCounters;
pub use effects::{EffectInbox, EngineEffects, Rejection, ThrottleFilter};
pub use engine::EngineSound;
pub use logging::{LogLevel, LogStream, BG_LOG_STREAM, CTRL_LOG_STREAM};
