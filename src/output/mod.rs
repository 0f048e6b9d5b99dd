//! Output container

pub mod muxer;

pub use muxer::AudioMuxer;
