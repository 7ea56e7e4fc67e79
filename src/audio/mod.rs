//! Audio subsystem: PCM buffer, volume transform, playback engine.
//!
//! Architecture:
//! - PCM8 buffer, normalized once at load time (not in the hot path)
//! - 256-entry volume LUT + mute flag, rebuilt on volume changes
//! - Timer-ISR playback loop: wrap cursor, LUT transform, DAC write

pub mod buffer;
pub mod player;
pub mod volume;

pub use buffer::{normalize_pcm8, LoadError, PcmBuffer, MAX_PCM_BYTES};
pub use player::{ToneClock, TonePlayer};
pub use volume::VolumeLut;

/// DAC idle/center value: silence on the unsigned 8-bit output.
pub const DAC_IDLE: u8 = 128;
