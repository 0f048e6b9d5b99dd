//! Input media
//!
//! This module handles:
//! - Stream enumeration (`cuecut streams`)
//! - Resolving which audio/subtitle stream to use, interactively if needed
//! - Reading packets of the selected audio stream

pub mod input;

use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;

use ffmpeg_next as ffmpeg;
use serde::{Serialize, Serializer};

use crate::error::{CueCutError, FfmpegError, Result};
use crate::ffmpeg_utils::{helpers, utils};

pub use input::AudioInput;

/// Media kinds the extractor cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Subtitle,
    Other,
}

impl MediaKind {
    fn from_medium(medium: ffmpeg::media::Type) -> Self {
        match medium {
            ffmpeg::media::Type::Audio => MediaKind::Audio,
            ffmpeg::media::Type::Subtitle => MediaKind::Subtitle,
            _ => MediaKind::Other,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MediaKind::Audio => "audio",
            MediaKind::Subtitle => "subtitle",
            MediaKind::Other => "other",
        })
    }
}

/// Immutable description of one stream of an opened input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamDescriptor {
    pub index: usize,
    pub kind: MediaKind,
    #[serde(skip)]
    pub codec_id: ffmpeg::codec::Id,
    pub codec: String,
    #[serde(serialize_with = "serialize_rational")]
    pub time_base: ffmpeg::Rational,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u16>,
    pub title: Option<String>,
    pub language: Option<String>,
}

fn serialize_rational<S: Serializer>(
    value: &ffmpeg::Rational,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{}/{}", value.numerator(), value.denominator()))
}

impl StreamDescriptor {
    pub fn from_stream(stream: &ffmpeg::Stream) -> Self {
        let params = stream.parameters();
        let kind = MediaKind::from_medium(params.medium());
        let (sample_rate, channels) = if kind == MediaKind::Audio {
            (
                Some(helpers::codec_params_sample_rate(&params)),
                Some(helpers::codec_params_channels(&params)),
            )
        } else {
            (None, None)
        };
        Self {
            index: stream.index(),
            kind,
            codec_id: params.id(),
            codec: params.id().name().to_string(),
            time_base: stream.time_base(),
            sample_rate,
            channels,
            title: utils::get_stream_title(stream),
            language: utils::get_stream_language(stream),
        }
    }

    /// One-line summary, numbered from 1 as shown to users.
    pub fn summary(&self, number: usize) -> String {
        format!(
            "#{} {} stream: {} ({})",
            number,
            self.kind,
            self.title.as_deref().unwrap_or("Unknown"),
            self.language.as_deref().unwrap_or("Unknown")
        )
    }
}

/// Enumerate every stream of the media file at `path`.
pub fn list_streams(path: &Path) -> Result<Vec<StreamDescriptor>> {
    let input = ffmpeg::format::input(path)
        .map_err(|e| FfmpegError::OpenInput(format!("{}: {}", path.display(), e)))?;
    let streams: Vec<StreamDescriptor> = input
        .streams()
        .map(|stream| StreamDescriptor::from_stream(&stream))
        .collect();
    tracing::debug!(path = %path.display(), streams = streams.len(), "listed input streams");
    Ok(streams)
}

/// Streams of one kind, in file order.
pub fn filter_kind(streams: &[StreamDescriptor], kind: MediaKind) -> Vec<StreamDescriptor> {
    streams.iter().filter(|s| s.kind == kind).cloned().collect()
}

/// Asks which of several candidate streams to use.
pub trait StreamChooser {
    /// Position (0-based) of the chosen stream within `candidates`.
    fn choose(&mut self, kind: MediaKind, candidates: &[StreamDescriptor]) -> Result<usize>;
}

/// Resolve the stream of `kind` to use among `streams`.
///
/// `requested` is a 1-based number among the streams of that kind. Without
/// one, a single candidate is taken as is and several are put to `chooser`.
pub fn select_stream(
    streams: &[StreamDescriptor],
    kind: MediaKind,
    requested: Option<usize>,
    chooser: &mut dyn StreamChooser,
) -> Result<StreamDescriptor> {
    let candidates = filter_kind(streams, kind);
    if candidates.is_empty() {
        return Err(CueCutError::StreamNotFound(format!("no {} streams found", kind)));
    }

    let position = match requested {
        Some(n) if n >= 1 && n <= candidates.len() => n - 1,
        Some(n) => {
            return Err(CueCutError::InvalidInput(format!(
                "{} stream #{} requested, but there are {}",
                kind,
                n,
                candidates.len()
            )))
        }
        None if candidates.len() == 1 => 0,
        None => chooser.choose(kind, &candidates)?,
    };

    let chosen = candidates.into_iter().nth(position).ok_or_else(|| {
        CueCutError::InvalidInput(format!("{} stream #{} does not exist", kind, position + 1))
    })?;
    tracing::info!(
        stream_index = chosen.index,
        kind = %kind,
        codec = chosen.codec.as_str(),
        "selected stream"
    );
    Ok(chosen)
}

/// Lists the candidates and reads a number from a line-oriented input.
pub struct PromptChooser<R: BufRead, W: Write> {
    input: R,
    output: W,
    /// Whether a person is there to answer; otherwise asking is an error
    interactive: bool,
}

impl<R: BufRead, W: Write> PromptChooser<R, W> {
    pub fn new(input: R, output: W, interactive: bool) -> Self {
        Self {
            input,
            output,
            interactive,
        }
    }
}

impl<R: BufRead, W: Write> StreamChooser for PromptChooser<R, W> {
    fn choose(&mut self, kind: MediaKind, candidates: &[StreamDescriptor]) -> Result<usize> {
        if !self.interactive {
            return Err(CueCutError::InvalidInput(format!(
                "{} {} streams found; choose one with --{}-stream",
                candidates.len(),
                kind,
                kind
            )));
        }

        for (i, stream) in candidates.iter().enumerate() {
            writeln!(self.output, "{}", stream.summary(i + 1))?;
        }
        self.output.flush()?;

        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(CueCutError::InvalidInput(format!(
                    "input closed before a {} stream was chosen",
                    kind
                )));
            }
            match line.trim().parse::<usize>() {
                Ok(n) if n >= 1 && n <= candidates.len() => return Ok(n - 1),
                _ => {
                    write!(
                        self.output,
                        "> Please, enter a number between [1] and [{}]: ",
                        candidates.len()
                    )?;
                    self.output.flush()?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    fn descriptor(index: usize, kind: MediaKind, title: Option<&str>) -> StreamDescriptor {
        StreamDescriptor {
            index,
            kind,
            codec_id: ffmpeg::codec::Id::None,
            codec: "test".into(),
            time_base: ffmpeg::Rational::new(1, 1000),
            sample_rate: None,
            channels: None,
            title: title.map(str::to_string),
            language: None,
        }
    }

    fn streams() -> Vec<StreamDescriptor> {
        vec![
            descriptor(0, MediaKind::Other, None),
            descriptor(1, MediaKind::Audio, Some("English")),
            descriptor(2, MediaKind::Subtitle, None),
            descriptor(3, MediaKind::Audio, Some("Commentary")),
        ]
    }

    struct Panicking;

    impl StreamChooser for Panicking {
        fn choose(&mut self, _: MediaKind, _: &[StreamDescriptor]) -> Result<usize> {
            panic!("chooser must not be asked");
        }
    }

    #[test]
    fn test_summary_defaults_to_unknown() {
        let d = descriptor(3, MediaKind::Audio, Some("Commentary"));
        assert_eq!(d.summary(2), "#2 audio stream: Commentary (Unknown)");
    }

    #[test]
    fn test_single_candidate_needs_no_choice() {
        let chosen = select_stream(&streams(), MediaKind::Subtitle, None, &mut Panicking).unwrap();
        assert_eq!(chosen.index, 2);
    }

    #[test]
    fn test_requested_number_is_one_based() {
        let chosen = select_stream(&streams(), MediaKind::Audio, Some(2), &mut Panicking).unwrap();
        assert_eq!(chosen.index, 3);
    }

    #[test]
    fn test_requested_out_of_range() {
        let err = select_stream(&streams(), MediaKind::Audio, Some(3), &mut Panicking).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = select_stream(&streams(), MediaKind::Audio, Some(0), &mut Panicking).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_no_candidates_is_not_found() {
        let only_audio = vec![descriptor(0, MediaKind::Audio, None)];
        let err = select_stream(&only_audio, MediaKind::Subtitle, None, &mut Panicking).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_prompt_reasks_until_valid() {
        let mut output = Vec::new();
        let mut chooser = PromptChooser::new(Cursor::new("abc\n7\n2\n"), &mut output, true);
        let chosen = select_stream(&streams(), MediaKind::Audio, None, &mut chooser).unwrap();
        assert_eq!(chosen.index, 3);

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("#1 audio stream: English (Unknown)\n"));
        assert!(shown.contains("#2 audio stream: Commentary (Unknown)\n"));
        assert_eq!(
            shown.matches("> Please, enter a number between [1] and [2]: ").count(),
            2
        );
    }

    #[test]
    fn test_prompt_input_closed() {
        let mut chooser = PromptChooser::new(Cursor::new("x\n"), Vec::new(), true);
        let err = select_stream(&streams(), MediaKind::Audio, None, &mut chooser).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_non_interactive_ambiguity_is_an_error() {
        let mut chooser = PromptChooser::new(Cursor::new("1\n"), Vec::new(), false);
        let err = select_stream(&streams(), MediaKind::Audio, None, &mut chooser).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_descriptor_serializes_time_base() {
        let json = serde_json::to_value(descriptor(1, MediaKind::Audio, None)).unwrap();
        assert_eq!(json["time_base"], "1/1000");
        assert_eq!(json["kind"], "audio");
        assert!(json.get("sample_rate").is_none());
    }
}
