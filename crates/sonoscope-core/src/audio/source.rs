//! The PCM source seam between the pipeline and whatever produces audio

use crate::types::Sample;

/// A pulled source of mono f32 PCM at the engine sample rate
///
/// `read` fills a prefix of `out` and returns the number of frames
/// written; once the source is exhausted it keeps returning 0. Callers are
/// responsible for zero-padding short reads.
///
/// Implementations must be real-time safe: `read` is called from the audio
/// callback and must not allocate, lock, or perform I/O.
pub trait PcmSource: Send {
    /// Pull up to `out.len()` frames; returns the count actually written
    fn read(&mut self, out: &mut [Sample]) -> usize;
}
