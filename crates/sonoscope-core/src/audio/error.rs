//! Audio backend error types

use thiserror::Error;

/// Errors that can occur while opening or driving audio hardware
#[derive(Error, Debug)]
pub enum AudioError {
    /// No input device is available for capture
    #[error("No audio input device found")]
    NoInputDevice,

    /// No output device is available for playback
    #[error("No audio output device found")]
    NoOutputDevice,

    /// A configured device name did not match any device
    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    /// Failed to query or negotiate a device configuration
    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    /// Failed to build the audio stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    /// Failed to start the audio stream
    #[error("Failed to start audio stream: {0}")]
    StreamPlayError(String),
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
