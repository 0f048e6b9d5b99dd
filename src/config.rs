//! Extraction configuration

use serde::{Deserialize, Serialize};

use crate::error::{CueCutError, Result};
use crate::ffmpeg_utils::helpers;

/// Target encoding of the extracted audio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Codec short name (`mp3`, `aac`, `mp2`, ...) or FFmpeg encoder name
    pub codec: String,

    /// Output channel count (1 or 2)
    pub channels: u16,

    /// Output sample rate in Hz
    pub sample_rate: u32,

    /// Output bit rate in bps
    pub bit_rate: u64,

    /// FFmpeg sample format name the encoder is fed (`s16p`, `fltp`, ...)
    pub sample_format: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            codec: "mp3".to_string(),
            channels: 2,
            sample_rate: 48000,
            bit_rate: 256_000,
            sample_format: "s16p".to_string(),
        }
    }
}

/// Cue timing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueConfig {
    /// Guard margin added before and after every cue, in milliseconds
    pub guard_margin_ms: i64,

    /// Cue length assumed when a subtitle event has no duration
    pub default_duration_ms: i64,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            guard_margin_ms: 1000,
            default_duration_ms: 2000,
        }
    }
}

/// Output container configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Container format name; guessed from the output file name when unset
    pub format: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub encoder: EncoderConfig,
    pub cues: CueConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

impl ExtractConfig {
    /// Reject values no encoder or cue planner could work with.
    pub fn validate(&self) -> Result<()> {
        let enc = &self.encoder;
        if enc.codec.trim().is_empty() {
            return Err(CueCutError::Config("encoder codec is empty".into()));
        }
        if !(1..=2).contains(&enc.channels) {
            return Err(CueCutError::Config(format!(
                "unsupported channel count {} (expected 1 or 2)",
                enc.channels
            )));
        }
        if enc.sample_rate == 0 || enc.sample_rate > i32::MAX as u32 {
            return Err(CueCutError::Config(format!(
                "invalid sample rate {}",
                enc.sample_rate
            )));
        }
        if enc.bit_rate == 0 {
            return Err(CueCutError::Config("bit rate must be positive".into()));
        }
        if helpers::parse_sample_format(&enc.sample_format).is_none() {
            return Err(CueCutError::Config(format!(
                "unknown sample format '{}'",
                enc.sample_format
            )));
        }
        if self.cues.guard_margin_ms < 0 {
            return Err(CueCutError::Config(format!(
                "guard margin must not be negative, got {}",
                self.cues.guard_margin_ms
            )));
        }
        if self.cues.default_duration_ms <= 0 {
            return Err(CueCutError::Config(format!(
                "default cue duration must be positive, got {}",
                self.cues.default_duration_ms
            )));
        }
        match self.logging.format.to_ascii_lowercase().as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(CueCutError::Config(format!("unknown log format '{}'", other))),
        }
    }
}
