//! Headless engine
//!
//! An in-process engine without decoding or rendering. Position advances
//! only when [`HeadlessEngine::advance`] is called, which makes it usable
//! from the command line and from tests.

use std::sync::Arc;

use super::{
    EngineEvent, EngineFactory, EngineOptions, EventSender, MarkerSurface, PlaybackEngine,
    RemoteTextTrack,
};
use crate::chapters::Marker;
use crate::config::MarkerStyle;
use crate::error::Result;
use crate::resource::ObjectStore;
use crate::subtitle::count_cues;
use crate::types::SourceDescriptor;

/// A text track as the headless engine holds it
#[derive(Debug, Clone)]
pub struct AttachedTrack {
    pub track: RemoteTextTrack,
    pub manual_cleanup: bool,
    /// Cues found at the track address, if it could be resolved
    pub cue_count: Option<usize>,
}

pub struct HeadlessEngine {
    options: EngineOptions,
    events: EventSender,
    store: Option<Arc<ObjectStore>>,
    sources: Vec<SourceDescriptor>,
    position: f64,
    duration: Option<f64>,
    playing: bool,
    tracks: Vec<AttachedTrack>,
    markers: Vec<Marker>,
    disposed: bool,
}

impl HeadlessEngine {
    pub fn new(options: EngineOptions, events: EventSender) -> Self {
        Self {
            options,
            events,
            store: None,
            sources: Vec::new(),
            position: 0.0,
            duration: None,
            playing: false,
            tracks: Vec::new(),
            markers: Vec::new(),
            disposed: false,
        }
    }

    /// Resolve track addresses through `store`
    pub fn with_store(mut self, store: Arc<ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Stop advancing at `duration` seconds
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    fn emit(&self, event: EngineEvent) {
        if self.disposed {
            return;
        }
        // Receiver gone means the session is being torn down
        let _ = self.events.send(event);
    }

    /// Move the position forward by `dt` seconds while playing
    pub fn advance(&mut self, dt: f64) {
        if self.disposed || !self.playing {
            return;
        }
        let mut next = self.position + dt;
        if let Some(duration) = self.duration {
            if next >= duration {
                next = duration;
                self.playing = false;
            }
        }
        self.position = next;
        self.emit(EngineEvent::TimeUpdate);
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn tracks(&self) -> &[AttachedTrack] {
        &self.tracks
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl PlaybackEngine for HeadlessEngine {
    fn set_sources(&mut self, sources: &[SourceDescriptor]) {
        if self.disposed {
            return;
        }
        self.sources = sources.to_vec();
        self.position = 0.0;
        self.playing = false;
        // Tracks not marked for manual cleanup go with the old source
        self.tracks.retain(|t| t.manual_cleanup);

        self.emit(EngineEvent::LoadStart);
        if self.sources.is_empty() {
            self.emit(EngineEvent::Error(
                "MEDIA_ERR_SRC_NOT_SUPPORTED: no source".to_string(),
            ));
            return;
        }
        self.emit(EngineEvent::CanPlay);
        if self.options.display.autoplay {
            self.playing = true;
        }
    }

    fn play(&mut self) {
        if !self.disposed && !self.sources.is_empty() {
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, time: f64) {
        if self.disposed {
            return;
        }
        self.emit(EngineEvent::Seeking);
        let mut time = time.max(0.0);
        if let Some(duration) = self.duration {
            time = time.min(duration);
        }
        self.position = time;
        self.emit(EngineEvent::Seeked);
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn add_remote_text_track(&mut self, track: RemoteTextTrack, manual_cleanup: bool) {
        if self.disposed {
            return;
        }
        let cue_count = self
            .store
            .as_ref()
            .and_then(|s| s.resolve(&track.src))
            .map(|o| count_cues(&String::from_utf8_lossy(&o.data)));
        tracing::debug!(
            label = %track.label,
            srclang = %track.srclang,
            default = track.default,
            cues = ?cue_count,
            "text track added"
        );
        self.tracks.push(AttachedTrack {
            track,
            manual_cleanup,
            cue_count,
        });
    }

    fn marker_surface(&mut self) -> Option<&mut dyn MarkerSurface> {
        Some(self)
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.playing = false;
        self.tracks.clear();
        self.markers.clear();
    }
}

impl MarkerSurface for HeadlessEngine {
    fn add_markers(&mut self, style: &MarkerStyle, markers: Vec<Marker>) {
        tracing::trace!(color = %style.background_color, count = markers.len(), "markers");
        self.markers.extend(markers);
    }
}

/// Creates [`HeadlessEngine`]s. Ready is signalled as soon as the engine
/// exists.
#[derive(Debug, Default, Clone)]
pub struct HeadlessEngineFactory {
    store: Option<Arc<ObjectStore>>,
    duration: Option<f64>,
}

impl HeadlessEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: Arc<ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }
}

impl EngineFactory for HeadlessEngineFactory {
    type Engine = HeadlessEngine;

    fn create(&self, options: &EngineOptions, events: EventSender) -> Result<HeadlessEngine> {
        let mut engine = HeadlessEngine::new(options.clone(), events);
        if let Some(store) = &self.store {
            engine = engine.with_store(store.clone());
        }
        if let Some(duration) = self.duration {
            engine = engine.with_duration(duration);
        }
        engine.emit(EngineEvent::Ready);
        Ok(engine)
    }
}
