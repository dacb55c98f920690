//! Playback engine abstraction
//!
//! The engine itself (decoding, rendering, adaptive streaming) is external.
//! Sessions drive it through [`PlaybackEngine`] and receive its timing and
//! lifecycle signals as [`EngineEvent`]s on an unbounded channel.

pub mod headless;

pub use headless::{HeadlessEngine, HeadlessEngineFactory};

use tokio::sync::mpsc;

use crate::chapters::Marker;
use crate::config::{DisplayConfig, MarkerStyle};
use crate::error::Result;
use crate::types::{CaptionKind, SourceDescriptor};

/// Signals emitted by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Ready,
    TimeUpdate,
    Seeking,
    Seeked,
    Error(String),
    LoadStart,
    CanPlay,
}

impl EngineEvent {
    /// Event name as the engine reports it
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::Ready => "ready",
            EngineEvent::TimeUpdate => "timeupdate",
            EngineEvent::Seeking => "seeking",
            EngineEvent::Seeked => "seeked",
            EngineEvent::Error(_) => "error",
            EngineEvent::LoadStart => "loadstart",
            EngineEvent::CanPlay => "canplay",
        }
    }

    /// Events that move the playback position
    pub fn is_timing(&self) -> bool {
        matches!(
            self,
            EngineEvent::TimeUpdate | EngineEvent::Seeking | EngineEvent::Seeked
        )
    }
}

pub type EventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Options applied when the engine is instantiated
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub display: DisplayConfig,
    pub poster: Option<String>,
}

/// Descriptor for a remote text track
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteTextTrack {
    pub kind: CaptionKind,
    pub src: String,
    pub srclang: String,
    pub label: String,
    pub default: bool,
}

/// Optional timeline marker capability
pub trait MarkerSurface {
    fn add_markers(&mut self, style: &MarkerStyle, markers: Vec<Marker>);
}

/// A playback engine instance owned by one session
pub trait PlaybackEngine: Send + 'static {
    fn set_sources(&mut self, sources: &[SourceDescriptor]);

    fn play(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, time: f64);

    /// Playback position in seconds
    fn current_time(&self) -> f64;

    /// Attach a text track. `manual_cleanup` false lets the engine remove
    /// the track when its source changes.
    fn add_remote_text_track(&mut self, track: RemoteTextTrack, manual_cleanup: bool);

    /// Timeline markers, when the engine supports them
    fn marker_surface(&mut self) -> Option<&mut dyn MarkerSurface> {
        None
    }

    fn dispose(&mut self);
}

/// Instantiates engines for new sessions
pub trait EngineFactory: Send + Sync + 'static {
    type Engine: PlaybackEngine;

    /// Create an engine that reports through `events`. Failure is fatal to
    /// the session being created.
    fn create(&self, options: &EngineOptions, events: EventSender) -> Result<Self::Engine>;
}
