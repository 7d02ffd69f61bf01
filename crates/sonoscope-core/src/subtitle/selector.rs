//! Active-cue selection
//!
//! Runs once per audio callback, so the common case - the clock is still
//! inside the cue picked last time - must be O(1). Only when the cached
//! index stops covering the timestamp does the selector fall back to a
//! binary search over the track.

use super::SubtitleTrack;
use crate::types::NO_ACTIVE_CUE;

/// Stateful cue cursor owned by the audio thread
///
/// When cues overlap, the cue with the latest start time not after `t`
/// wins; equal start times resolve to the earlier index.
#[derive(Debug, Clone, Copy)]
pub struct CueSelector {
    last: i32,
}

impl CueSelector {
    /// A selector with no cached cue
    pub fn new() -> Self {
        Self { last: NO_ACTIVE_CUE }
    }

    /// Index of the cue active at `t` seconds, or -1
    ///
    /// Bounds are inclusive on both ends: `t == start` and `t == end` both
    /// select the cue.
    pub fn select(&mut self, track: &SubtitleTrack, t: f64) -> i32 {
        // Fast path: the previously selected cue still covers t.
        if self.last >= 0 {
            if let Some(cue) = track.get(self.last as usize) {
                if t >= cue.start && t <= cue.end {
                    return self.last;
                }
            }
        }

        let cues = track.cues();
        let upper = cues.partition_point(|cue| cue.start <= t);
        if upper == 0 {
            self.last = NO_ACTIVE_CUE;
            return self.last;
        }

        // Greatest start <= t; step back to the first cue of an equal-start
        // run so the earlier index wins ties.
        let mut index = upper - 1;
        while index > 0 && cues[index - 1].start == cues[index].start {
            index -= 1;
        }

        self.last = if t <= cues[index].end {
            index as i32
        } else {
            NO_ACTIVE_CUE
        };
        self.last
    }
}

impl Default for CueSelector {
    fn default() -> Self {
        Self::new()
    }
}
