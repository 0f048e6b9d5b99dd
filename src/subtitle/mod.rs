//! Subtitle cues
//!
//! This module turns a subtitle stream into the cue windows that drive
//! extraction:
//! - Payload text extraction (blank events do not open a cue)
//! - Cue sources (subtitle stream reader, in-memory list)
//! - Guard margin and monotonic window planning

pub mod cues;
pub mod extractor;

pub use cues::{CueList, CueSource, CueWindowPlanner, SubtitleCueSource};
