//! Audio stream configuration
//!
//! The signal format is fixed (48kHz, mono-preferred, f32); configuration
//! covers device selection and the hardware period.

use serde::{Deserialize, Serialize};

/// Hardware period requested from the device, in frames
/// (~5.3ms at 48kHz)
pub const PERIOD_FRAMES: u32 = 256;

/// Configuration for opening an audio session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Device name as reported by the backend (None = system default).
    /// Selects the input device in capture mode and the output device in
    /// playback mode.
    #[serde(default)]
    pub device: Option<String>,

    /// Requested period in frames; clamped to the device's supported range
    #[serde(default = "default_period")]
    pub period_frames: u32,
}

fn default_period() -> u32 {
    PERIOD_FRAMES
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            period_frames: PERIOD_FRAMES,
        }
    }
}

impl AudioConfig {
    /// Select a device by name
    pub fn with_device(mut self, name: impl Into<String>) -> Self {
        self.device = Some(name.into());
        self
    }

    /// Request a specific hardware period
    pub fn with_period_frames(mut self, frames: u32) -> Self {
        self.period_frames = frames;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AudioConfig::default();
        assert_eq!(config.device, None);
        assert_eq!(config.period_frames, 256);
    }

    #[test]
    fn test_builder() {
        let config = AudioConfig::default()
            .with_device("pipewire")
            .with_period_frames(512);
        assert_eq!(config.device.as_deref(), Some("pipewire"));
        assert_eq!(config.period_frames, 512);
    }
}
