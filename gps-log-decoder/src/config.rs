//! Parser configuration
//!
//! The configuration recognized by the core pipeline. The surrounding
//! application decides where the values come from (command line, profile
//! file); the pipeline only reads them.

use serde::{Deserialize, Serialize};

/// Configuration for a parsing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Minimum byte offset before capture may begin (default: 1 MB)
    #[serde(default = "default_offset_bytes")]
    pub offset_bytes: u64,

    /// Capture window length in receiver-time seconds (default: 30 s)
    #[serde(default = "default_max_duration")]
    pub max_duration_seconds: f64,

    /// Target sampling rate per message type (default: 1 Hz)
    #[serde(default = "default_frequency")]
    pub frequency_hz: f64,

    /// Whether the raw audit stream also records lines scanned while the
    /// cursor is still seeking the start position (default: false, i.e. raw
    /// capture is gated by the same start condition as the typed streams)
    #[serde(default)]
    pub raw_while_seeking: bool,
}

fn default_offset_bytes() -> u64 {
    1_000_000
}

fn default_max_duration() -> f64 {
    30.0
}

fn default_frequency() -> f64 {
    1.0
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            offset_bytes: default_offset_bytes(),
            max_duration_seconds: default_max_duration(),
            frequency_hz: default_frequency(),
            raw_while_seeking: false,
        }
    }
}

impl ParserConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the minimum start offset in bytes
    pub fn with_offset_bytes(mut self, offset_bytes: u64) -> Self {
        self.offset_bytes = offset_bytes;
        self
    }

    /// Builder method: set the capture window length in seconds
    pub fn with_max_duration(mut self, seconds: f64) -> Self {
        self.max_duration_seconds = seconds;
        self
    }

    /// Builder method: set the target sampling rate in Hz
    pub fn with_frequency(mut self, hz: f64) -> Self {
        self.frequency_hz = hz;
        self
    }

    /// Builder method: record raw lines while still seeking the start
    pub fn with_raw_while_seeking(mut self, enabled: bool) -> Self {
        self.raw_while_seeking = enabled;
        self
    }

    /// Minimum spacing between accepted records of one type, in seconds
    ///
    /// A non-positive frequency disables sampling (every record passes).
    pub fn sampling_interval(&self) -> f64 {
        if self.frequency_hz > 0.0 {
            1.0 / self.frequency_hz
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::new();
        assert_eq!(config.offset_bytes, 1_000_000);
        assert_eq!(config.max_duration_seconds, 30.0);
        assert_eq!(config.frequency_hz, 1.0);
        assert!(!config.raw_while_seeking);
    }

    #[test]
    fn test_builder() {
        let config = ParserConfig::new()
            .with_offset_bytes(4096)
            .with_max_duration(10.0)
            .with_frequency(2.0)
            .with_raw_while_seeking(true);

        assert_eq!(config.offset_bytes, 4096);
        assert_eq!(config.max_duration_seconds, 10.0);
        assert_eq!(config.sampling_interval(), 0.5);
        assert!(config.raw_while_seeking);
    }

    #[test]
    fn test_zero_frequency_disables_sampling() {
        let config = ParserConfig::new().with_frequency(0.0);
        assert_eq!(config.sampling_interval(), 0.0);
    }
}
