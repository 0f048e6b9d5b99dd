//! FFmpeg utility functions

use ffmpeg_next as ffmpeg;

/// Extract language from stream metadata
pub fn get_stream_language(stream: &ffmpeg::Stream) -> Option<String> {
    stream.metadata().get("language").map(|s| s.to_string())
}

/// Get the title from stream metadata
pub fn get_stream_title(stream: &ffmpeg::Stream) -> Option<String> {
    stream.metadata().get("title").map(|s| s.to_string())
}

/// Check if a subtitle codec is text-based (vs bitmap)
pub fn is_text_subtitle_codec(codec_id: ffmpeg::codec::Id) -> bool {
    matches!(
        codec_id,
        ffmpeg::codec::Id::SUBRIP
            | ffmpeg::codec::Id::ASS
            | ffmpeg::codec::Id::MOV_TEXT
            | ffmpeg::codec::Id::TEXT
            | ffmpeg::codec::Id::WEBVTT
            | ffmpeg::codec::Id::SSA
    )
}

/// Format a millisecond timestamp as `HH:MM:SS.mmm`
pub fn format_timestamp(ms: i64) -> String {
    let total_ms = ms.max(0) as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00:00:00.000");
        assert_eq!(format_timestamp(1000), "00:00:01.000");
        assert_eq!(format_timestamp(61000), "00:01:01.000");
        assert_eq!(format_timestamp(3661250), "01:01:01.250");
        assert_eq!(format_timestamp(-1000), "00:00:00.000");
    }

    #[test]
    fn test_is_text_subtitle_codec() {
        assert!(is_text_subtitle_codec(ffmpeg::codec::Id::SUBRIP));
        assert!(is_text_subtitle_codec(ffmpeg::codec::Id::MOV_TEXT));
        assert!(!is_text_subtitle_codec(
            ffmpeg::codec::Id::HDMV_PGS_SUBTITLE
        ));
    }
}
