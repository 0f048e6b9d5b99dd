//! Subtitle payload text
//!
//! Cues are only needed for their timing, but packets whose payload carries
//! no text (blank events that clear the screen) must not open a cue window.
//! This module pulls the visible text out of a text subtitle packet so the
//! cue source can tell the two apart.

use ffmpeg_next as ffmpeg;

/// Visible text of a subtitle packet payload, trimmed. Empty when the packet
/// only clears the screen.
pub fn payload_text(codec_id: ffmpeg::codec::Id, data: &[u8]) -> String {
    match codec_id {
        ffmpeg::codec::Id::MOV_TEXT => mov_text(data),
        ffmpeg::codec::Id::ASS | ffmpeg::codec::Id::SSA => clean_ass_text(&ass_dialogue_text(
            &String::from_utf8_lossy(data),
        )),
        _ => String::from_utf8_lossy(data).trim().to_string(),
    }
}

/// MOV_TEXT (tx3g / 3GPP Timed Text) payload.
///
/// ```text
/// [0..2]   uint16_be  text length (N)
/// [2..2+N] UTF-8 text
/// [2+N..]  optional binary style boxes (styl, hlit, ...), ignored
/// ```
fn mov_text(data: &[u8]) -> String {
    if data.len() < 2 {
        return String::new();
    }
    let text_len = u16::from_be_bytes([data[0], data[1]]) as usize;
    // Declared length past the end of the packet is clamped
    let end = (2 + text_len).min(data.len());
    String::from_utf8_lossy(&data[2..end]).trim().to_string()
}

/// Text field of a Matroska-style ASS event:
/// `ReadOrder,Layer,Style,Name,MarginL,MarginR,MarginV,Effect,Text`.
///
/// Payloads that do not look like an event line are returned whole.
fn ass_dialogue_text(line: &str) -> String {
    let fields: Vec<&str> = line.splitn(9, ',').collect();
    if fields.len() == 9 {
        fields[8].to_string()
    } else {
        line.to_string()
    }
}

/// Strip ASS/SSA override blocks like `{\pos(100,200)}` and hard breaks.
fn clean_ass_text(text: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for ch in text.chars() {
        if ch == '{' {
            in_tag = true;
        } else if ch == '}' {
            in_tag = false;
        } else if !in_tag {
            result.push(ch);
        }
    }

    result.replace("\\N", " ").replace("\\n", " ").trim().to_string()
}
