//! Engine lifecycle, per-callback pipeline, and shared telemetry
//!
//! This module contains the audio pipeline controller:
//! - Engine: the session state machine (Idle / Capture / Playback)
//! - DspPipeline + drivers: the code that runs inside the audio callback
//! - EngineTelemetry: the lock-free surface the host polls
//! - instance: the process-wide single-engine facade for FFI hosts

mod engine;
pub mod instance;
mod pipeline;
mod telemetry;

pub use engine::*;
pub use pipeline::*;
pub use telemetry::*;
