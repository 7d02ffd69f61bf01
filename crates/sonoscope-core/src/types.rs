//! Common types and constants for Sonoscope
//!
//! The DSP geometry is fixed: everything in the engine runs at 48kHz mono,
//! and the spectrum analyzer works on 1024-sample blocks.

/// Sample rate used by the device, the decoder, the media clock, and
/// subtitle time conversion.
pub const SAMPLE_RATE: u32 = 48_000;

/// FFT block length in samples (power of two, required by the radix-2
/// transform).
pub const FFT_SIZE: usize = 1024;

/// Number of published spectrum bins (the meaningful half of a real-input
/// FFT).
pub const FFT_BINS: usize = FFT_SIZE / 2;

/// Largest slice the pipeline processes in one go. Hardware callbacks are
/// ~256 frames; anything larger is partitioned into chunks of this size so
/// scratch buffers can be pre-allocated once.
pub const MAX_CHUNK_FRAMES: usize = 4096;

/// Audio sample type (32-bit float throughout the signal path)
pub type Sample = f32;

/// Telemetry value published when no subtitle cue is active
pub const NO_ACTIVE_CUE: i32 = -1;

/// Engine operating mode
///
/// `Idle` is the initial and post-stop state. `Capture` and `Playback` are
/// mutually exclusive and fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// No session running
    #[default]
    Idle,
    /// Analyzing the default input device (no audio output)
    Capture,
    /// Playing a decoded file while analyzing it
    Playback,
}

impl Mode {
    /// Whether a session is running in this mode
    pub fn is_active(&self) -> bool {
        !matches!(self, Mode::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_geometry() {
        assert!(FFT_SIZE.is_power_of_two());
        assert_eq!(FFT_BINS, 512);
        assert!(MAX_CHUNK_FRAMES >= FFT_SIZE);
    }

    #[test]
    fn test_mode_activity() {
        assert_eq!(Mode::default(), Mode::Idle);
        assert!(!Mode::Idle.is_active());
        assert!(Mode::Capture.is_active());
        assert!(Mode::Playback.is_active());
    }
}
