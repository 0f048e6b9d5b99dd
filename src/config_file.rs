//! Configuration file support
//!
//! Loads extraction configuration from TOML files. Every section and every
//! field is optional; whatever is missing keeps its default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ExtractConfig;
use crate::error::{CueCutError, Result};

/// Configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Encoder settings
    pub encoder: Option<EncoderSettings>,
    /// Cue timing settings
    pub cues: Option<CueSettings>,
    /// Output container settings
    pub output: Option<OutputSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// Codec short name or FFmpeg encoder name
    pub codec: Option<String>,
    /// Output channel count
    pub channels: Option<u16>,
    /// Output sample rate in Hz
    pub sample_rate: Option<u32>,
    /// Output bit rate in bps
    pub bit_rate: Option<u64>,
    /// Encoder input sample format
    pub sample_format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CueSettings {
    /// Guard margin around each cue in milliseconds
    pub guard_margin_ms: Option<i64>,
    /// Duration assumed for subtitle events without one
    pub default_duration_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Container format name
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| {
            CueCutError::Config(format!("{}: {}", path.as_ref().display(), e))
        })
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CueCutError::Config(format!("cannot serialize config: {}", e)))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Configuration file spelling out every default
    pub fn default_config() -> Self {
        let defaults = ExtractConfig::default();
        Self {
            encoder: Some(EncoderSettings {
                codec: Some(defaults.encoder.codec),
                channels: Some(defaults.encoder.channels),
                sample_rate: Some(defaults.encoder.sample_rate),
                bit_rate: Some(defaults.encoder.bit_rate),
                sample_format: Some(defaults.encoder.sample_format),
            }),
            cues: Some(CueSettings {
                guard_margin_ms: Some(defaults.cues.guard_margin_ms),
                default_duration_ms: Some(defaults.cues.default_duration_ms),
            }),
            output: Some(OutputSettings {
                format: defaults.output.format,
            }),
            logging: Some(LoggingSettings {
                level: Some(defaults.logging.level),
                format: Some(defaults.logging.format),
            }),
        }
    }

    /// Merge over the defaults
    pub fn into_extract_config(self) -> ExtractConfig {
        let mut config = ExtractConfig::default();

        if let Some(enc) = self.encoder {
            if let Some(codec) = enc.codec {
                config.encoder.codec = codec;
            }
            if let Some(channels) = enc.channels {
                config.encoder.channels = channels;
            }
            if let Some(rate) = enc.sample_rate {
                config.encoder.sample_rate = rate;
            }
            if let Some(bit_rate) = enc.bit_rate {
                config.encoder.bit_rate = bit_rate;
            }
            if let Some(format) = enc.sample_format {
                config.encoder.sample_format = format;
            }
        }
        if let Some(cues) = self.cues {
            if let Some(margin) = cues.guard_margin_ms {
                config.cues.guard_margin_ms = margin;
            }
            if let Some(duration) = cues.default_duration_ms {
                config.cues.default_duration_ms = duration;
            }
        }
        if let Some(output) = self.output {
            config.output.format = output.format.or(config.output.format);
        }
        if let Some(logging) = self.logging {
            if let Some(level) = logging.level {
                config.logging.level = level;
            }
            if let Some(format) = logging.format {
                config.logging.format = format;
            }
        }

        config
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    ConfigFile::default_config().to_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_matches_defaults() {
        let config = ConfigFile::default_config().into_extract_config();
        assert_eq!(config, ExtractConfig::default());
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[encoder]\ncodec = \"mp2\"\nchannels = 1\n\n[cues]\nguard_margin_ms = 250\n")
            .unwrap();

        let config = ConfigFile::from_file(temp_file.path())
            .unwrap()
            .into_extract_config();
        assert_eq!(config.encoder.codec, "mp2");
        assert_eq!(config.encoder.channels, 1);
        assert_eq!(config.encoder.sample_rate, 48000);
        assert_eq!(config.cues.guard_margin_ms, 250);
        assert_eq!(config.cues.default_duration_ms, 2000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = ConfigFile::from_file(temp_file.path())
            .unwrap()
            .into_extract_config();
        assert_eq!(config, ExtractConfig::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[encoder\ncodec = 3").unwrap();
        let err = ConfigFile::from_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, CueCutError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ConfigFile::from_file("/nonexistent/cuecut.toml").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::IoFailure);
    }

    #[test]
    fn test_generate_default_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        generate_default_config(&path).unwrap();

        let loaded = ConfigFile::from_file(&path).unwrap();
        assert_eq!(loaded.encoder.unwrap().codec.as_deref(), Some("mp3"));
    }
}
