//! Compressed-audio decoding to mono PCM
//!
//! Playback decodes the whole file up front on the host thread, so the
//! audio callback only ever copies from memory. Symphonia handles the
//! container and codec; this module mixes the result down to mono and
//! enforces the engine's fixed 48kHz rate (resampling is out of scope, so
//! off-rate files are rejected).

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use crate::audio::PcmSource;
use crate::types::{Sample, SAMPLE_RATE};

/// Errors that can occur while opening and decoding a file
#[derive(Error, Debug)]
pub enum DecodeError {
    /// File could not be opened
    #[error("Failed to open file: {0}")]
    Io(#[from] std::io::Error),

    /// Container format not recognized or not supported
    #[error("Unrecognized audio container: {0}")]
    Probe(String),

    /// The container holds no decodable audio track
    #[error("No decodable audio track")]
    NoTrack,

    /// No decoder available for the track's codec
    #[error("Unsupported codec: {0}")]
    Codec(String),

    /// The file is not at the engine sample rate
    #[error("Unsupported sample rate: expected {expected}Hz, found {found}Hz")]
    SampleRate { expected: u32, found: u32 },

    /// Decoding produced no audio at all
    #[error("File contains no audio frames")]
    Empty,
}

/// Result type for decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// A fully decoded file: mono f32 at 48kHz, read from memory
#[derive(Debug)]
pub struct DecodedAudio {
    samples: Vec<Sample>,
    cursor: usize,
}

impl DecodedAudio {
    /// Open and decode a file
    pub fn open(path: &Path) -> DecodeResult<Self> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }
        Self::from_stream(mss, hint)
    }

    /// Decode an already-opened media source
    fn from_stream(mss: MediaSourceStream, hint: Hint) -> DecodeResult<Self> {
        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::Probe(e.to_string()))?;
        let mut format = probed.format;

        let track = format.default_track().ok_or(DecodeError::NoTrack)?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| DecodeError::Probe("sample rate not reported".to_string()))?;
        if sample_rate != SAMPLE_RATE {
            return Err(DecodeError::SampleRate {
                expected: SAMPLE_RATE,
                found: sample_rate,
            });
        }
        let channels = codec_params
            .channels
            .map(|c| c.count())
            .unwrap_or(1)
            .max(1);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::Codec(e.to_string()))?;

        let mut interleaved: Vec<f32> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                // End of stream (and any unrecoverable read error) ends
                // the decode with whatever was produced so far.
                Err(_) => break,
            };
            if packet.track_id() != track_id {
                continue;
            }
            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // Skip corrupt packets rather than failing the whole file.
                Err(_) => continue,
            };
            let spec = *decoded.spec();
            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }

        if interleaved.is_empty() {
            return Err(DecodeError::Empty);
        }

        let samples = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        log::info!(
            "Decoded {} frames ({:.2}s) from {} channel(s)",
            samples.len(),
            samples.len() as f64 / SAMPLE_RATE as f64,
            channels
        );

        Ok(Self { samples, cursor: 0 })
    }

    /// Total decoded length in frames
    pub fn frames(&self) -> usize {
        self.samples.len()
    }

    /// Total decoded length in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / SAMPLE_RATE as f64
    }
}

impl PcmSource for DecodedAudio {
    fn read(&mut self, out: &mut [Sample]) -> usize {
        let remaining = self.samples.len() - self.cursor;
        let n = remaining.min(out.len());
        out[..n].copy_from_slice(&self.samples[self.cursor..self.cursor + n]);
        self.cursor += n;
        n
    }
}
