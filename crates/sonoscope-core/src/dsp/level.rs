//! RMS level metering

use crate::types::Sample;

/// Root mean square of a block of samples
///
/// Returns 0 for an empty block; the audio backend never delivers one, but
/// the meter should not divide by zero if a caller does.
pub fn rms(samples: &[Sample]) -> Sample {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
