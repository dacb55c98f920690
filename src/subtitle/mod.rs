//! Subtitle conversion module
//!
//! Converts SubRip caption files to WebVTT so the engine can load them
//! as remote text tracks.

pub mod webvtt;

pub use webvtt::{bytes_to_webvtt, count_cues, srt_to_webvtt, WEBVTT_HEADER, WEBVTT_MIME};
