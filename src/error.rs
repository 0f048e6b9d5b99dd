use thiserror::Error;

/// Main error type for cue-synchronized extraction
#[derive(Error, Debug)]
pub enum CueCutError {
    /// An error originating from the underlying FFmpeg library
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] FfmpegError),

    /// A standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A requested stream could not be found in the media file
    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    /// Malformed cue source, wrong stream count/type or bad arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A buffer or queue allocation failed
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// Configuration file or value error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// FFmpeg-specific errors
#[derive(Error, Debug)]
pub enum FfmpegError {
    /// Failure during global FFmpeg initialization
    #[error("FFmpeg initialization failed: {0}")]
    InitFailed(String),

    /// Failure opening an input media file
    #[error("Failed to open input file: {0}")]
    OpenInput(String),

    /// The requested decoder for a specific codec ID was not found
    #[error("Failed to find decoder: {0}")]
    DecoderNotFound(String),

    /// Failure instantiating a decoder
    #[error("Failed to create decoder: {0}")]
    DecoderCreate(String),

    /// The requested encoder was not found
    #[error("Failed to find encoder: {0}")]
    EncoderNotFound(String),

    /// Failure instantiating or opening an encoder
    #[error("Failed to create encoder: {0}")]
    EncoderCreate(String),

    /// Failure creating an audio resampler
    #[error("Failed to create resampler: {0}")]
    ResamplerCreate(String),

    /// Failure converting samples
    #[error("Failed to resample: {0}")]
    Resample(String),

    /// Failure creating an output format muxer
    #[error("Failed to create muxer: {0}")]
    MuxerCreate(String),

    /// Failure writing the container header
    #[error("Failed to write header: {0}")]
    WriteHeader(String),

    /// Failure writing a media packet to the container
    #[error("Failed to write packet: {0}")]
    WritePacket(String),

    /// Failure writing the container trailer
    #[error("Failed to write trailer: {0}")]
    WriteTrailer(String),

    /// Failure repositioning the read cursor
    #[error("Failed to seek: {0}")]
    Seek(String),

    /// Failure reading a packet from the input context
    #[error("Failed to read packet: {0}")]
    ReadPacket(String),

    /// Failure decoding a single packet into a frame
    #[error("Failed to decode packet: {0}")]
    DecodePacket(String),

    /// Failure encoding a single frame into a packet
    #[error("Failed to encode frame: {0}")]
    EncodeFrame(String),

    /// An invalid or unexpected timebase was encountered
    #[error("Invalid timebase: {0}")]
    InvalidTimebase(String),
}

/// Coarse classification of every failure the pipeline can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No decoder/encoder for the requested format, or no matching stream
    NotFound,
    /// Allocation failure during buffer/queue operations
    OutOfMemory,
    /// Malformed cue source, wrong stream count/type
    InvalidInput,
    /// Read/write/seek failure from a collaborator
    IoFailure,
    /// Decode/encode/resample rejection
    CodecFailure,
}

impl CueCutError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CueCutError::Ffmpeg(e) => e.kind(),
            CueCutError::Io(_) => ErrorKind::IoFailure,
            CueCutError::StreamNotFound(_) => ErrorKind::NotFound,
            CueCutError::InvalidInput(_) | CueCutError::Config(_) => ErrorKind::InvalidInput,
            CueCutError::OutOfMemory(_) => ErrorKind::OutOfMemory,
        }
    }
}

impl FfmpegError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FfmpegError::DecoderNotFound(_) | FfmpegError::EncoderNotFound(_) => {
                ErrorKind::NotFound
            }
            FfmpegError::InitFailed(_)
            | FfmpegError::OpenInput(_)
            | FfmpegError::MuxerCreate(_)
            | FfmpegError::WriteHeader(_)
            | FfmpegError::WritePacket(_)
            | FfmpegError::WriteTrailer(_)
            | FfmpegError::Seek(_)
            | FfmpegError::ReadPacket(_) => ErrorKind::IoFailure,
            FfmpegError::DecoderCreate(_)
            | FfmpegError::EncoderCreate(_)
            | FfmpegError::ResamplerCreate(_)
            | FfmpegError::Resample(_)
            | FfmpegError::DecodePacket(_)
            | FfmpegError::EncodeFrame(_) => ErrorKind::CodecFailure,
            FfmpegError::InvalidTimebase(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CueCutError>;
