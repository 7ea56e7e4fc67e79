//! PCM8 sample buffer and load-time normalization.
//!
//! The loaded recording is scanned for its dynamic range and rescaled into
//! a safe, DC-centered window once, at load time, so playback volume is
//! independent of how loud the source recording happened to be. The ISR
//! only ever indexes the finished buffer.

use alloc::vec::Vec;

/// Hard cap on the loaded sample size (1 MiB).
pub const MAX_PCM_BYTES: usize = 1024 * 1024;

/// Center value normalization re-centers on.
pub const NORM_CENTER: u8 = 127;

/// Lowest sample value after normalization.
pub const NORM_FLOOR: u8 = 19;

/// Highest sample value after normalization.
pub const NORM_CEIL: u8 = 237;

/// Why a buffer load was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// Source could not be read.
    Io,
    /// Source is empty or larger than [`MAX_PCM_BYTES`].
    Size,
    /// Memory for the buffer could not be obtained.
    Alloc,
}

impl LoadError {
    /// Stable numeric id for diagnostics counters (0 is reserved for
    /// "none").
    pub const fn id(&self) -> u8 {
        match self {
            Self::Io => 1,
            Self::Size => 2,
            Self::Alloc => 3,
        }
    }

    /// Short reason string for log lines.
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Io => "source unreadable",
            Self::Size => "invalid size",
            Self::Alloc => "out of memory",
        }
    }
}

impl core::fmt::Display for LoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "load failed: {}", self.message())
    }
}

/// Owned buffer of unsigned 8-bit PCM samples.
///
/// Replaced wholesale on load; the old buffer is released before the new
/// one is allocated, never aliased.
pub struct PcmBuffer {
    data: Vec<u8>,
}

impl PcmBuffer {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Release the current buffer, leaving the player silent.
    pub fn release(&mut self) {
        self.data = Vec::new();
    }

    /// Replace the buffer with a normalized copy of `bytes`.
    ///
    /// The old buffer is released first. On any error the buffer stays
    /// empty; the caller decides what silence looks like.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<u32, LoadError> {
        self.release();

        if bytes.is_empty() || bytes.len() > MAX_PCM_BYTES {
            return Err(LoadError::Size);
        }

        let mut data = Vec::new();
        data.try_reserve_exact(bytes.len())
            .map_err(|_| LoadError::Alloc)?;
        data.extend_from_slice(bytes);

        normalize_pcm8(&mut data);

        self.data = data;
        Ok(self.data.len() as u32)
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> u32 {
        self.data.len() as u32
    }

    /// True if no recording is loaded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The samples.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Default for PcmBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize unsigned 8-bit PCM in place.
///
/// Scans for min/max, then rescales so the full dynamic range lands in
/// `[NORM_FLOOR, NORM_CEIL]` centered on [`NORM_CENTER`]. A buffer with no
/// usable range (`max - min < 2`) is only re-centered, never stretched.
pub fn normalize_pcm8(data: &mut [u8]) {
    if data.is_empty() {
        return;
    }

    let mut max_value: u8 = 0;
    let mut min_value: u8 = 255;
    for &sample in data.iter() {
        if sample > max_value {
            max_value = sample;
        }
        if sample < min_value {
            min_value = sample;
        }
    }

    let center = (max_value as f32 + min_value as f32) * 0.5;
    let dynamic_range = (max_value - min_value) as f32;

    let (scale, offset) = if dynamic_range < 2.0 {
        (1.0, NORM_CENTER as f32 - center)
    } else {
        let scale = 218.0 / dynamic_range;
        (scale, NORM_CENTER as f32 - center * scale)
    };

    for sample in data.iter_mut() {
        let value = (*sample as f32) * scale + offset;
        let value = value.clamp(NORM_FLOOR as f32, NORM_CEIL as f32);
        *sample = value as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_full_range() {
        let mut data: Vec<u8> = (0..=255).collect();
        normalize_pcm8(&mut data);

        for &sample in &data {
            assert!((NORM_FLOOR..=NORM_CEIL).contains(&sample));
        }
        assert_eq!(data[0], NORM_FLOOR);
        // 255 * (218/255) + 18 = 236: the window ceiling is a clamp, not a
        // guarantee the scale reaches it
        assert_eq!(*data.last().unwrap(), 236);
    }

    #[test]
    fn test_normalize_dc_recenter() {
        // Pure DC at 50: no range, recenter path
        let mut data = vec![50u8; 100];
        normalize_pcm8(&mut data);

        for &sample in &data {
            assert!((126..=128).contains(&sample), "got {}", sample);
        }
    }

    #[test]
    fn test_normalize_quiet_recording_stretched() {
        // A timid recording around mid-scale gets its range expanded
        let mut data = vec![120u8, 130, 125, 122, 128];
        normalize_pcm8(&mut data);

        let min = *data.iter().min().unwrap();
        let max = *data.iter().max().unwrap();
        assert!(max - min > 100, "range {}..{} not stretched", min, max);
        assert!(min >= NORM_FLOOR && max <= NORM_CEIL);
    }

    #[test]
    fn test_normalize_preserves_ordering() {
        let mut data = vec![10u8, 200, 90, 90, 40];
        normalize_pcm8(&mut data);

        assert!(data[0] < data[2]);
        assert!(data[2] < data[1]);
        assert_eq!(data[2], data[3]);
    }

    #[test]
    fn test_load_rejects_empty() {
        let mut buffer = PcmBuffer::new();
        assert_eq!(buffer.load_bytes(&[]), Err(LoadError::Size));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_load_rejects_oversized() {
        let mut buffer = PcmBuffer::new();
        let huge = vec![0u8; MAX_PCM_BYTES + 1];
        assert_eq!(buffer.load_bytes(&huge), Err(LoadError::Size));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_load_replaces_old_buffer() {
        let mut buffer = PcmBuffer::new();
        assert_eq!(buffer.load_bytes(&[1, 2, 3, 4]), Ok(4));
        assert_eq!(buffer.len(), 4);

        // A failed load releases the old buffer first
        assert_eq!(buffer.load_bytes(&[]), Err(LoadError::Size));
        assert!(buffer.is_empty());

        assert_eq!(buffer.load_bytes(&[9; 10]), Ok(10));
        assert_eq!(buffer.len(), 10);
    }

    #[test]
    fn test_load_normalizes() {
        let mut buffer = PcmBuffer::new();
        buffer.load_bytes(&[0, 255, 128]).unwrap();

        let data = buffer.as_slice();
        assert_eq!(data[0], NORM_FLOOR);
        assert_eq!(data[1], 236);
        assert_eq!(data[2], 127);
    }

    #[test]
    fn test_error_ids_distinct() {
        assert_ne!(LoadError::Io.id(), LoadError::Size.id());
        assert_ne!(LoadError::Size.id(), LoadError::Alloc.id());
        assert_ne!(LoadError::Io.id(), 0);
    }
}
