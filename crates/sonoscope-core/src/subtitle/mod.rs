//! SubRip subtitle store and active-cue selection
//!
//! Cues are parsed from SubRip text into an ordered, immutable track. The
//! host replaces the track wholesale while the engine is stopped; the audio
//! thread queries it through [`CueSelector`] once per callback.

mod parser;
mod selector;

pub use parser::ParseError;
pub use selector::CueSelector;

/// A single subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    /// Display start, seconds
    pub start: f64,
    /// Display end, seconds (inclusive; `start <= end`)
    pub end: f64,
    /// Cue body; multi-line text joined with `\n`
    pub text: String,
}

/// An ordered list of subtitle cues
///
/// Invariants: `start` is non-decreasing across the list, and every cue
/// satisfies `start <= end`. Cues may overlap; resolution is the
/// selector's job.
#[derive(Debug, Default)]
pub struct SubtitleTrack {
    cues: Vec<SubtitleCue>,
}

impl SubtitleTrack {
    /// A track with no cues
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse SubRip text into a track
    ///
    /// The parse is strict: any malformed record fails the whole call and
    /// nothing is produced. Cues are stable-sorted by start time afterwards
    /// so the selector's binary search holds even for files whose records
    /// are out of order (well-formed files are already sorted and keep
    /// their record order exactly).
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut cues = parser::parse(input)?;
        cues.sort_by(|a, b| a.start.total_cmp(&b.start));
        Ok(Self { cues })
    }

    /// Number of cues
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the track has no cues
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// All cues in start-time order
    pub fn cues(&self) -> &[SubtitleCue] {
        &self.cues
    }

    /// Cue at `index`, if in range
    pub fn get(&self, index: usize) -> Option<&SubtitleCue> {
        self.cues.get(index)
    }

    /// Cue text for a telemetry index
    ///
    /// Negative or out-of-range indices yield the empty string, never an
    /// error - the index may be a stale telemetry read.
    pub fn text(&self, index: i32) -> &str {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.cues.get(i))
            .map(|cue| cue.text.as_str())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_lookup_bounds() {
        let track =
            SubtitleTrack::parse("1\n00:00:01,000 --> 00:00:02,000\nHello\n").unwrap();
        assert_eq!(track.text(0), "Hello");
        assert_eq!(track.text(-1), "");
        assert_eq!(track.text(1), "");
        assert_eq!(track.text(i32::MAX), "");
    }

    #[test]
    fn test_out_of_order_records_are_sorted() {
        let input = "1\n00:00:10,000 --> 00:00:11,000\nlater\n\n\
                     2\n00:00:01,000 --> 00:00:02,000\nearlier\n";
        let track = SubtitleTrack::parse(input).unwrap();
        assert_eq!(track.get(0).unwrap().text, "earlier");
        assert_eq!(track.get(1).unwrap().text, "later");
    }

    #[test]
    fn test_equal_starts_keep_record_order() {
        let input = "1\n00:00:01,000 --> 00:00:05,000\nfirst\n\n\
                     2\n00:00:01,000 --> 00:00:03,000\nsecond\n";
        let track = SubtitleTrack::parse(input).unwrap();
        assert_eq!(track.get(0).unwrap().text, "first");
        assert_eq!(track.get(1).unwrap().text, "second");
    }
}
