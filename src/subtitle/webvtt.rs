//! SubRip to WebVTT conversion
//!
//! The conversion is text-level only. It never parses cues, so malformed
//! input still produces a document with a valid WebVTT header that the
//! engine's forgiving parser can skip through.

use regex::Regex;
use std::sync::OnceLock;

/// WebVTT file signature line
pub const WEBVTT_HEADER: &str = "WEBVTT";

/// MIME type of converted captions
pub const WEBVTT_MIME: &str = "text/vtt";

const BOM: char = '\u{FEFF}';

fn timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]{2}:[0-9]{2}:[0-9]{2}),([0-9]{3})").expect("static regex"))
}

fn sequence_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[0-9]+\s*\n").expect("static regex"))
}

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("static regex"))
}

/// Convert SubRip text to WebVTT text.
///
/// Steps, in order:
/// 1. drop a leading byte-order mark
/// 2. `HH:MM:SS,mmm` becomes `HH:MM:SS.mmm`
/// 3. lines holding only ASCII digits (cue sequence numbers) are removed
/// 4. three or more consecutive newlines collapse to two
/// 5. the result is trimmed and prefixed with the header and a blank line
pub fn srt_to_webvtt(srt: &str) -> String {
    let text = srt.strip_prefix(BOM).unwrap_or(srt);

    let text = timestamp_re().replace_all(text, "${1}.${2}");
    let text = sequence_line_re().replace_all(&text, "");
    let text = blank_run_re().replace_all(&text, "\n\n");

    let body = text.trim_matches(|c: char| c.is_whitespace() || c == BOM);
    let mut out = String::with_capacity(WEBVTT_HEADER.len() + 2 + body.len());
    out.push_str(WEBVTT_HEADER);
    out.push_str("\n\n");
    out.push_str(body);
    out
}

/// Decode fetched caption bytes and convert them.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn bytes_to_webvtt(bytes: &[u8]) -> String {
    srt_to_webvtt(&String::from_utf8_lossy(bytes))
}

/// Count cue timing lines in a WebVTT document
pub fn count_cues(vtt: &str) -> usize {
    vtt.lines().filter(|l| l.contains("-->")).count()
}
