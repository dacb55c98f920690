//! Caller-supplied player inputs
//!
//! Sources, caption specs and chapters as the embedding page describes
//! them. All of these are immutable once handed to a session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A playable media source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub src: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(default)]
    pub label: String,
}

impl SourceDescriptor {
    pub fn new(src: impl Into<String>, mime_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            mime_type: mime_type.into(),
            label: label.into(),
        }
    }
}

/// Text track kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionKind {
    #[default]
    Subtitles,
    Captions,
    Descriptions,
    Chapters,
    Metadata,
}

impl CaptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionKind::Subtitles => "subtitles",
            CaptionKind::Captions => "captions",
            CaptionKind::Descriptions => "descriptions",
            CaptionKind::Chapters => "chapters",
            CaptionKind::Metadata => "metadata",
        }
    }
}

impl fmt::Display for CaptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caption track to fetch, convert and attach.
///
/// Identity is the position in the input sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSpec {
    pub src: String,
    #[serde(default)]
    pub kind: CaptionKind,
    pub srclang: String,
    pub label: String,
    #[serde(default)]
    pub default: bool,
}

impl CaptionSpec {
    pub fn new(src: impl Into<String>, srclang: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            kind: CaptionKind::default(),
            srclang: srclang.into(),
            label: label.into(),
            default: false,
        }
    }

    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    pub fn with_kind(mut self, kind: CaptionKind) -> Self {
        self.kind = kind;
        self
    }
}

/// A named segment of the video starting at `start_time` seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(rename = "time", alias = "start_time")]
    pub start_time: f64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Chapter {
    pub fn new(start_time: f64, title: impl Into<String>) -> Self {
        Self {
            start_time,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Input shapes that are accepted as-is but whose outcome is decided by a
/// tie-break rather than by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationAmbiguity {
    /// More than one caption claims to be the default track
    MultipleDefaultCaptions { indices: Vec<usize> },
    /// Chapter at `index` starts before its predecessor
    UnsortedChapters { index: usize },
}

impl fmt::Display for ConfigurationAmbiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationAmbiguity::MultipleDefaultCaptions { indices } => {
                write!(f, "multiple default captions at indices {:?}", indices)
            }
            ConfigurationAmbiguity::UnsortedChapters { index } => {
                write!(f, "chapter {} starts before chapter {}", index, index - 1)
            }
        }
    }
}

/// Find ambiguous caption and chapter inputs. Nothing is rejected.
pub fn detect_ambiguities(captions: &[CaptionSpec], chapters: &[Chapter]) -> Vec<ConfigurationAmbiguity> {
    let mut found = Vec::new();

    let defaults: Vec<usize> = captions
        .iter()
        .enumerate()
        .filter(|(_, c)| c.default)
        .map(|(i, _)| i)
        .collect();
    if defaults.len() > 1 {
        found.push(ConfigurationAmbiguity::MultipleDefaultCaptions { indices: defaults });
    }

    if let Some(index) = chapters
        .windows(2)
        .position(|w| w[1].start_time < w[0].start_time)
    {
        found.push(ConfigurationAmbiguity::UnsortedChapters { index: index + 1 });
    }

    found
}
