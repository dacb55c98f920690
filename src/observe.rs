//! Observability sink
//!
//! Session and loader code reports what happened as [`SessionEvent`]s to an
//! injected [`EventSink`] instead of logging directly.

use parking_lot::Mutex;

use crate::session::SessionState;
use crate::types::ConfigurationAmbiguity;

/// Something worth reporting about a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    CaptionAttached {
        index: usize,
        label: String,
        address: String,
        is_default: bool,
    },
    CaptionFetchFailed {
        index: usize,
        label: String,
        location: String,
        reason: String,
    },
    /// Converted but not attached because the engine was already disposed
    CaptionDropped { index: usize, label: String },
    CaptionsLoaded { attached: usize, total: usize },
    MarkersAdded { count: usize },
    ChapterChanged { title: Option<String> },
    ResourcesReleased { count: usize },
    EngineError { message: String },
    /// Informational engine lifecycle signal (loadstart, canplay)
    EngineNotice { event: &'static str },
    Ambiguity(ConfigurationAmbiguity),
}

/// Receives session events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SessionEvent);
}

/// Default sink: forwards every event to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: SessionEvent) {
        match event {
            SessionEvent::StateChanged { from, to } => {
                tracing::debug!(%from, %to, "session state changed");
            }
            SessionEvent::CaptionAttached {
                index,
                label,
                address,
                is_default,
            } => {
                tracing::info!(index, %label, %address, is_default, "caption track attached");
            }
            SessionEvent::CaptionFetchFailed {
                index,
                label,
                location,
                reason,
            } => {
                tracing::error!(index, %label, %location, %reason, "failed to load caption");
            }
            SessionEvent::CaptionDropped { index, label } => {
                tracing::debug!(index, %label, "engine disposed, caption dropped");
            }
            SessionEvent::CaptionsLoaded { attached, total } => {
                tracing::info!(attached, total, "captions added");
            }
            SessionEvent::MarkersAdded { count } => {
                tracing::info!(count, "chapter markers added");
            }
            SessionEvent::ChapterChanged { title } => {
                tracing::debug!(title = title.as_deref().unwrap_or("-"), "active chapter changed");
            }
            SessionEvent::ResourcesReleased { count } => {
                tracing::debug!(count, "caption resources released");
            }
            SessionEvent::EngineError { message } => {
                tracing::error!(%message, "playback engine error");
            }
            SessionEvent::EngineNotice { event } => {
                tracing::info!(event, "playback engine event");
            }
            SessionEvent::Ambiguity(ambiguity) => {
                tracing::warn!(%ambiguity, "ambiguous player configuration");
            }
        }
    }
}

/// Sink that keeps every event, for inspection
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    /// Events matching a predicate
    pub fn matching(&self, f: impl Fn(&SessionEvent) -> bool) -> Vec<SessionEvent> {
        self.events.lock().iter().filter(|e| f(e)).cloned().collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: SessionEvent) {
        self.events.lock().push(event);
    }
}
