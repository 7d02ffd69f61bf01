//! Per-callback DSP path
//!
//! [`DspPipeline`] is the code that runs inside the audio callback:
//!
//! ```text
//! source -> gain -> DC blocker -> { sum of squares -> RMS
//!                                   FFT ring -> spectrum publish }
//!        -> clock advance -> cue select
//! ```
//!
//! # Real-Time Safety
//!
//! Everything here is pre-allocated at construction. The process methods
//! never allocate, never lock, and never perform I/O; all cross-thread
//! traffic goes through [`EngineTelemetry`]'s atomics. Callbacks larger
//! than [`MAX_CHUNK_FRAMES`] are partitioned.

use std::sync::Arc;

use crate::audio::PcmSource;
use crate::dsp::{level, DcBlocker, SpectrumAnalyzer};
use crate::engine::telemetry::EngineTelemetry;
use crate::subtitle::{CueSelector, SubtitleTrack};
use crate::types::{Sample, MAX_CHUNK_FRAMES, SAMPLE_RATE};

/// The analysis chain run once per callback chunk
pub struct DspPipeline {
    telemetry: Arc<EngineTelemetry>,
    subtitles: Arc<SubtitleTrack>,
    dc: DcBlocker,
    analyzer: SpectrumAnalyzer,
    selector: CueSelector,
    /// Gain-applied, DC-blocked samples of the current chunk
    analysis: Box<[Sample]>,
}

impl DspPipeline {
    /// Build a pipeline with fresh DSP state
    ///
    /// The `Arc`s are the only links back to the host; the pipeline itself
    /// is moved into the audio callback.
    pub fn new(telemetry: Arc<EngineTelemetry>, subtitles: Arc<SubtitleTrack>) -> Self {
        Self {
            telemetry,
            subtitles,
            dc: DcBlocker::new(),
            analyzer: SpectrumAnalyzer::new(),
            selector: CueSelector::new(),
            analysis: vec![0.0; MAX_CHUNK_FRAMES].into_boxed_slice(),
        }
    }

    /// Process one callback's worth of mono frames
    pub fn process_block(&mut self, input: &[Sample]) {
        for chunk in input.chunks(MAX_CHUNK_FRAMES) {
            self.process_chunk(chunk);
        }
    }

    fn process_chunk(&mut self, chunk: &[Sample]) {
        let n = chunk.len();
        if n == 0 {
            return;
        }

        let gain = self.telemetry.master_gain();
        let frames = &mut self.analysis[..n];
        for (dst, &src) in frames.iter_mut().zip(chunk) {
            *dst = self.dc.process(src * gain);
        }

        for &sample in frames.iter() {
            if self.analyzer.push(sample) {
                self.telemetry.spectrum().publish(self.analyzer.magnitudes());
            }
        }

        self.telemetry.set_rms(level::rms(frames));

        // The clock must advance before the selector runs, so a cue
        // observed at time t reflects frames processed up to t.
        let total = self.telemetry.advance_clock(n as u64);
        let t = total as f64 / SAMPLE_RATE as f64;
        let index = self.selector.select(&self.subtitles, t);
        self.telemetry.publish_subtitle_index(index);
    }
}

/// Capture-mode callback state: interleaved hardware input in, telemetry out
pub struct CaptureDriver {
    pipeline: DspPipeline,
    /// Channel-0 extraction scratch for multi-channel devices
    mono: Box<[Sample]>,
}

impl CaptureDriver {
    /// Wrap a pipeline for capture
    pub fn new(pipeline: DspPipeline) -> Self {
        Self {
            pipeline,
            mono: vec![0.0; MAX_CHUNK_FRAMES].into_boxed_slice(),
        }
    }

    /// Feed one hardware callback of interleaved input frames
    pub fn ingest(&mut self, data: &[Sample], channels: usize) {
        if channels <= 1 {
            self.pipeline.process_block(data);
            return;
        }
        for frames in data.chunks(MAX_CHUNK_FRAMES * channels) {
            let n = frames.len() / channels;
            for (dst, frame) in self.mono[..n].iter_mut().zip(frames.chunks_exact(channels)) {
                *dst = frame[0];
            }
            self.pipeline.process_block(&self.mono[..n]);
        }
    }
}

/// Playback-mode callback state: decoded source to hardware out, with the
/// same frames fed to the analysis chain
pub struct PlaybackDriver {
    pipeline: DspPipeline,
    source: Box<dyn PcmSource>,
    /// Decoder pull scratch; also what the analysis chain reads
    scratch: Box<[Sample]>,
}

impl PlaybackDriver {
    /// Wrap a pipeline and a source for playback
    pub fn new(pipeline: DspPipeline, source: Box<dyn PcmSource>) -> Self {
        Self {
            pipeline,
            source,
            scratch: vec![0.0; MAX_CHUNK_FRAMES].into_boxed_slice(),
        }
    }

    /// Render one hardware callback into the interleaved output buffer
    ///
    /// Reads short of the requested frame count are zero-padded, so the
    /// clock keeps counting requested frames after the source runs dry.
    pub fn render(&mut self, output: &mut [Sample], channels: usize) {
        let channels = channels.max(1);
        for frames in output.chunks_mut(MAX_CHUNK_FRAMES * channels) {
            let n = frames.len() / channels;
            let scratch = &mut self.scratch[..n];
            let read = self.source.read(scratch);
            scratch[read..].fill(0.0);

            // The hardware plays the decoded frames untouched; master gain
            // only shapes the analysis path.
            for (frame, &sample) in frames.chunks_exact_mut(channels).zip(scratch.iter()) {
                frame.fill(sample);
            }

            self.pipeline.process_block(&self.scratch[..n]);
        }
    }
}
