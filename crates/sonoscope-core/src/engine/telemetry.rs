//! Lock-free telemetry shared between the audio thread and the host
//!
//! The audio thread writes, the host polls; nothing ever blocks. Scalar
//! gauges are word-sized atomics (floats travel as bit patterns in
//! `AtomicU32`), and the spectrum is double-buffered: the audio thread
//! fills the back buffer and swaps an atomic front index with release
//! ordering, so a reader never observes a half-written block.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, AtomicUsize, Ordering};

use crate::types::{Sample, FFT_BINS, NO_ACTIVE_CUE, SAMPLE_RATE};

/// Store an f32 in an AtomicU32
#[inline]
fn f32_to_bits(value: f32) -> u32 {
    value.to_bits()
}

/// Load an f32 back out of an AtomicU32
#[inline]
fn bits_to_f32(bits: u32) -> f32 {
    f32::from_bits(bits)
}

/// Lock-free engine state for host access
///
/// The audio thread is the only writer of everything except
/// `master_gain`, which the host sets and the audio thread reads.
pub struct EngineTelemetry {
    /// Whether a session is running
    is_running: AtomicBool,
    /// Most recent per-callback RMS, as f32 bits
    rms: AtomicU32,
    /// Gain applied at the head of the analysis chain, as f32 bits
    master_gain: AtomicU32,
    /// Frames processed since the session started (the media clock)
    frames_processed: AtomicU64,
    /// Index of the active subtitle cue, -1 when none
    subtitle_index: AtomicI32,
    /// Double-buffered magnitude spectrum
    spectrum: SpectrumBuffer,
}

impl EngineTelemetry {
    /// Create neutral telemetry (gain 1.0, everything else zero/none)
    pub fn new() -> Self {
        Self {
            is_running: AtomicBool::new(false),
            rms: AtomicU32::new(f32_to_bits(0.0)),
            master_gain: AtomicU32::new(f32_to_bits(1.0)),
            frames_processed: AtomicU64::new(0),
            subtitle_index: AtomicI32::new(NO_ACTIVE_CUE),
            spectrum: SpectrumBuffer::new(),
        }
    }

    /// Whether a session is running
    #[inline]
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.is_running.store(running, Ordering::Relaxed);
    }

    /// Most recent per-callback RMS level
    #[inline]
    pub fn rms(&self) -> Sample {
        bits_to_f32(self.rms.load(Ordering::Relaxed))
    }

    pub(crate) fn set_rms(&self, rms: Sample) {
        self.rms.store(f32_to_bits(rms), Ordering::Relaxed);
    }

    /// Current master gain
    #[inline]
    pub fn master_gain(&self) -> Sample {
        bits_to_f32(self.master_gain.load(Ordering::Relaxed))
    }

    /// Set the master gain for subsequent callbacks
    pub fn set_master_gain(&self, gain: Sample) {
        self.master_gain.store(f32_to_bits(gain), Ordering::Relaxed);
    }

    /// Frames processed since the session started
    #[inline]
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    /// Advance the media clock by `frames`, returning the new total
    pub(crate) fn advance_clock(&self, frames: u64) -> u64 {
        self.frames_processed.fetch_add(frames, Ordering::Relaxed) + frames
    }

    /// Media clock in seconds
    pub fn media_time(&self) -> f64 {
        self.frames_processed() as f64 / SAMPLE_RATE as f64
    }

    /// Index of the active subtitle cue, -1 when none
    ///
    /// Acquire pairs with the release publish so a cue-text lookup against
    /// the store is consistent with the index just read.
    #[inline]
    pub fn subtitle_index(&self) -> i32 {
        self.subtitle_index.load(Ordering::Acquire)
    }

    /// Publish a new cue index; the store only happens when the value
    /// changed (the audio thread is the sole writer, so the read-compare
    /// is race-free)
    pub(crate) fn publish_subtitle_index(&self, index: i32) {
        if self.subtitle_index.load(Ordering::Relaxed) != index {
            self.subtitle_index.store(index, Ordering::Release);
        }
    }

    /// The double-buffered spectrum
    pub fn spectrum(&self) -> &SpectrumBuffer {
        &self.spectrum
    }

    /// Return every gauge to its neutral value (gain is preserved - it is
    /// host state, not session state)
    pub(crate) fn reset(&self) {
        self.rms.store(f32_to_bits(0.0), Ordering::Relaxed);
        self.frames_processed.store(0, Ordering::Relaxed);
        self.subtitle_index.store(NO_ACTIVE_CUE, Ordering::Release);
        self.spectrum.clear();
    }
}

impl Default for EngineTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

/// Double-buffered spectrum publication
///
/// Two `FFT_BINS`-slot buffers of f32 bit patterns plus an atomic front
/// index. The writer only ever touches the back buffer, so readers get a
/// coherent block from the front buffer even while the next one is being
/// written.
pub struct SpectrumBuffer {
    buffers: [Box<[AtomicU32]>; 2],
    front: AtomicUsize,
}

impl SpectrumBuffer {
    fn new() -> Self {
        let make = || (0..FFT_BINS).map(|_| AtomicU32::new(0)).collect();
        Self {
            buffers: [make(), make()],
            front: AtomicUsize::new(0),
        }
    }

    /// Write a block into the back buffer and swap it to the front
    ///
    /// Audio thread only.
    pub(crate) fn publish(&self, magnitudes: &[Sample; FFT_BINS]) {
        let back = 1 - self.front.load(Ordering::Relaxed);
        for (slot, &value) in self.buffers[back].iter().zip(magnitudes.iter()) {
            slot.store(value.to_bits(), Ordering::Relaxed);
        }
        self.front.store(back, Ordering::Release);
    }

    /// Copy the front buffer into `out`
    ///
    /// # Panics
    /// If `out` is not exactly `FFT_BINS` long.
    pub fn snapshot_into(&self, out: &mut [Sample]) {
        assert_eq!(out.len(), FFT_BINS);
        let front = self.front.load(Ordering::Acquire);
        for (dst, slot) in out.iter_mut().zip(self.buffers[front].iter()) {
            *dst = f32::from_bits(slot.load(Ordering::Relaxed));
        }
    }

    /// The front buffer as an owned array
    pub fn snapshot(&self) -> [Sample; FFT_BINS] {
        let mut out = [0.0; FFT_BINS];
        self.snapshot_into(&mut out);
        out
    }

    /// Zero both buffers
    pub(crate) fn clear(&self) {
        for buffer in &self.buffers {
            for slot in buffer.iter() {
                slot.store(0, Ordering::Relaxed);
            }
        }
        self.front.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_defaults() {
        let telemetry = EngineTelemetry::new();
        assert!(!telemetry.is_running());
        assert_eq!(telemetry.rms(), 0.0);
        assert_eq!(telemetry.master_gain(), 1.0);
        assert_eq!(telemetry.frames_processed(), 0);
        assert_eq!(telemetry.media_time(), 0.0);
        assert_eq!(telemetry.subtitle_index(), NO_ACTIVE_CUE);
        assert!(telemetry.spectrum().snapshot().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_float_gauges_round_trip() {
        let telemetry = EngineTelemetry::new();
        telemetry.set_rms(0.707);
        telemetry.set_master_gain(0.25);
        assert_eq!(telemetry.rms(), 0.707);
        assert_eq!(telemetry.master_gain(), 0.25);
    }

    #[test]
    fn test_clock_accumulates() {
        let telemetry = EngineTelemetry::new();
        assert_eq!(telemetry.advance_clock(256), 256);
        assert_eq!(telemetry.advance_clock(256), 512);
        assert_eq!(telemetry.frames_processed(), 512);
        telemetry.advance_clock(48_000 - 512);
        assert_eq!(telemetry.media_time(), 1.0);
    }

    #[test]
    fn test_reset_preserves_gain() {
        let telemetry = EngineTelemetry::new();
        telemetry.set_master_gain(0.5);
        telemetry.set_rms(0.9);
        telemetry.advance_clock(1000);
        telemetry.publish_subtitle_index(3);

        telemetry.reset();
        assert_eq!(telemetry.rms(), 0.0);
        assert_eq!(telemetry.frames_processed(), 0);
        assert_eq!(telemetry.subtitle_index(), NO_ACTIVE_CUE);
        assert_eq!(telemetry.master_gain(), 0.5);
    }

    #[test]
    fn test_spectrum_publish_and_snapshot() {
        let buffer = SpectrumBuffer::new();
        let mut block = [0.0f32; FFT_BINS];
        block[9] = 0.5;
        block[511] = 0.125;
        buffer.publish(&block);

        let snap = buffer.snapshot();
        assert_eq!(snap[9], 0.5);
        assert_eq!(snap[511], 0.125);
        assert_eq!(snap[0], 0.0);

        // A second publish lands in the other buffer and becomes visible.
        block[9] = 0.25;
        buffer.publish(&block);
        assert_eq!(buffer.snapshot()[9], 0.25);

        buffer.clear();
        assert!(buffer.snapshot().iter().all(|&m| m == 0.0));
    }
}
