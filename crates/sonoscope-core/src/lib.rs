//! Sonoscope Core - realtime audio DSP engine with lock-free telemetry
//!
//! The engine captures the microphone or plays back a decoded audio file and
//! publishes telemetry a visualization front-end polls at frame rate: the
//! current RMS level, a 512-bin magnitude spectrum, a sample-accurate media
//! clock, and the index of the active subtitle cue.
//!
//! Two threads are involved. The host thread issues control calls (start,
//! stop, gain, subtitle loading) and polls telemetry; the audio callback
//! thread, owned by the device backend, runs the DSP pipeline once per
//! hardware period. All shared state is exchanged through word-sized atomics
//! and a double-buffered spectrum - the audio thread never blocks, never
//! allocates, and never takes a lock.

pub mod audio;
pub mod decode;
pub mod dsp;
pub mod engine;
pub mod subtitle;
pub mod types;

pub use types::*;
