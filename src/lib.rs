//! Cue-synchronized audio extraction
//!
//! Keeps only the audio that plays while subtitle cues are on screen (plus a
//! guard margin), resamples it to a target format and encodes it into one
//! continuous output track.

pub mod cli;
pub mod config;
pub mod config_file;
pub mod error;
pub mod extract;
pub mod ffmpeg_utils;
pub mod media;
pub mod output;
pub mod subtitle;
pub mod timeline;
pub mod transcode;

#[cfg(test)]
pub(crate) mod tests;

pub use config::ExtractConfig;
pub use error::{CueCutError, ErrorKind, FfmpegError, Result};
pub use extract::{run_extraction, ExtractJob};
pub use ffmpeg_utils::version_info as ffmpeg_version_info;
pub use ffmpeg_utils::{init, install_log_filter};
pub use timeline::TimeRange;
pub use transcode::pipeline::{CueSyncPipeline, PipelineStats};
