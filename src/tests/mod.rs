//! Integration testing module
//!
//! - Synchronization loop scenarios over in-memory collaborators
//! - End-to-end extraction through real FFmpeg on synthetic files

pub mod e2e;
pub mod fixtures;
pub mod pipeline_scenarios;
