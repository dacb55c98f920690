//! Playback session
//!
//! A session owns one engine instance and every caption resource created
//! while it lives. It moves through
//! `Uninitialized -> Initializing -> Ready -> Disposed` exactly once and is
//! never re-initialized; a new configuration gets a new session.
//!
//! Engine events are delivered on a channel and processed with
//! [`PlaybackSession::pump`] or [`PlaybackSession::next_event`] +
//! [`PlaybackSession::handle_event`]. Handling `Ready` spawns the caption
//! loader, so it must happen inside a Tokio runtime.

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::captions::{CaptionFetcher, CaptionLoader, LoadReport, TrackTarget};
use crate::chapters::{chapter_markers, ChapterTracker};
use crate::engine::{
    EngineEvent, EngineFactory, EngineOptions, EventReceiver, PlaybackEngine, RemoteTextTrack,
};
use crate::error::{PlayerError, Result};
use crate::observe::{EventSink, SessionEvent};
use crate::player::PlayerProps;
use crate::resource::{ResourceAllocator, ResourceLedger};
use crate::types::{detect_ambiguities, CaptionSpec, Chapter, SourceDescriptor};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    Disposed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initializing => "initializing",
            SessionState::Ready => "ready",
            SessionState::Disposed => "disposed",
        };
        f.write_str(s)
    }
}

/// The engine, shared with the caption loader until disposal empties it
pub struct EngineSlot<E> {
    engine: Arc<Mutex<Option<E>>>,
}

impl<E> Clone for EngineSlot<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<E: PlaybackEngine> EngineSlot<E> {
    fn empty() -> Self {
        Self {
            engine: Arc::new(Mutex::new(None)),
        }
    }

    fn put(&self, engine: E) {
        *self.engine.lock() = Some(engine);
    }

    fn take(&self) -> Option<E> {
        self.engine.lock().take()
    }

    /// Run `f` against the live engine
    pub fn with<R>(&self, f: impl FnOnce(&mut E) -> R) -> Option<R> {
        self.engine.lock().as_mut().map(f)
    }
}

impl<E: PlaybackEngine> TrackTarget for EngineSlot<E> {
    fn is_live(&self) -> bool {
        self.engine.lock().is_some()
    }

    fn attach(&self, spec: &CaptionSpec, address: &str, is_default: bool) -> bool {
        self.with(|engine| {
            engine.add_remote_text_track(
                RemoteTextTrack {
                    kind: spec.kind,
                    src: address.to_string(),
                    srclang: spec.srclang.clone(),
                    label: spec.label.clone(),
                    default: is_default,
                },
                false,
            )
        })
        .is_some()
    }
}

/// Collaborators injected into every session
pub struct SessionDeps<F, A> {
    pub fetcher: Arc<F>,
    pub allocator: Arc<A>,
    pub sink: Arc<dyn EventSink>,
}

impl<F, A> Clone for SessionDeps<F, A> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            allocator: self.allocator.clone(),
            sink: self.sink.clone(),
        }
    }
}

pub struct PlaybackSession<E: PlaybackEngine, F: CaptionFetcher, A: ResourceAllocator> {
    id: Uuid,
    state: SessionState,
    props: PlayerProps,
    engine: EngineSlot<E>,
    events: Option<EventReceiver>,
    ledger: Arc<ResourceLedger<A>>,
    loader: CaptionLoader<F>,
    tracker: ChapterTracker,
    sink: Arc<dyn EventSink>,
    caption_task: Option<JoinHandle<LoadReport>>,
    report: Option<LoadReport>,
}

impl<E, F, A> PlaybackSession<E, F, A>
where
    E: PlaybackEngine,
    F: CaptionFetcher,
    A: ResourceAllocator,
{
    /// Create an uninitialized session for `props`
    pub fn new(props: PlayerProps, deps: SessionDeps<F, A>) -> Self {
        let tracker = ChapterTracker::new(props.chapters.clone());
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Uninitialized,
            engine: EngineSlot::empty(),
            events: None,
            ledger: Arc::new(ResourceLedger::new(deps.allocator)),
            loader: CaptionLoader::new(deps.fetcher, deps.sink.clone()),
            tracker,
            sink: deps.sink,
            caption_task: None,
            report: None,
            props,
        }
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        self.state = to;
        self.sink.emit(SessionEvent::StateChanged { from, to });
    }

    /// Instantiate the engine, apply the display configuration and push the
    /// sources. Only valid once, from `Uninitialized`.
    pub fn initialize<Fa>(&mut self, factory: &Fa) -> Result<()>
    where
        Fa: EngineFactory<Engine = E>,
    {
        if self.state != SessionState::Uninitialized {
            return Err(PlayerError::InvalidTransition {
                from: self.state,
                to: SessionState::Initializing,
            });
        }
        if self.props.sources.is_empty() {
            return Err(PlayerError::Config(
                "cannot initialize a session without sources".to_string(),
            ));
        }

        for ambiguity in detect_ambiguities(&self.props.captions, &self.props.chapters) {
            self.sink.emit(SessionEvent::Ambiguity(ambiguity));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let options = EngineOptions {
            display: self.props.display.clone(),
            poster: self.props.poster.clone(),
        };
        let mut engine = factory.create(&options, tx)?;
        engine.set_sources(&self.props.sources);

        self.engine.put(engine);
        self.events = Some(rx);
        tracing::debug!(session = %self.id, sources = self.props.sources.len(), "engine created");
        self.transition(SessionState::Initializing);
        Ok(())
    }

    /// React to one engine event
    pub fn handle_event(&mut self, event: EngineEvent) {
        if matches!(self.state, SessionState::Uninitialized | SessionState::Disposed) {
            return;
        }

        match event {
            EngineEvent::Ready => {
                if self.state == SessionState::Initializing {
                    self.on_ready();
                }
            }
            EngineEvent::Error(message) => {
                self.sink.emit(SessionEvent::EngineError { message });
            }
            EngineEvent::LoadStart | EngineEvent::CanPlay => {
                self.sink.emit(SessionEvent::EngineNotice {
                    event: event.name(),
                });
            }
            _ => {
                // Timing listeners exist only once the engine is ready
                if event.is_timing() && self.state == SessionState::Ready {
                    self.refresh_chapter();
                }
            }
        }
    }

    fn on_ready(&mut self) {
        self.transition(SessionState::Ready);

        if !self.props.chapters.is_empty() {
            let markers = chapter_markers(&self.props.chapters);
            let count = markers.len();
            let style = &self.props.marker_style;
            let added = self
                .engine
                .with(|engine| match engine.marker_surface() {
                    Some(surface) => {
                        surface.add_markers(style, markers);
                        true
                    }
                    None => false,
                })
                .unwrap_or(false);
            if added {
                self.sink.emit(SessionEvent::MarkersAdded { count });
            }
        }

        if !self.props.captions.is_empty() {
            let loader = self.loader.clone();
            let specs = self.props.captions.clone();
            let ledger = self.ledger.clone();
            let target = self.engine.clone();
            self.caption_task = Some(tokio::spawn(async move {
                loader.load(&specs, &ledger, &target).await
            }));
        }
    }

    fn refresh_chapter(&mut self) {
        let Some(time) = self.engine.with(|engine| engine.current_time()) else {
            return;
        };
        if self.tracker.update(time) {
            self.sink.emit(SessionEvent::ChapterChanged {
                title: self.tracker.active().map(|c| c.title),
            });
        }
    }

    /// Handle every event already queued. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.events.as_mut().and_then(|rx| rx.try_recv().ok()) {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next engine event. `None` once the engine is gone.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        self.events.as_mut()?.recv().await
    }

    /// Push a source list to the existing engine without reinitializing
    pub fn refresh_sources(&mut self, sources: Arc<[SourceDescriptor]>) {
        if self.engine.with(|engine| engine.set_sources(&sources)).is_some() {
            tracing::debug!(session = %self.id, sources = sources.len(), "sources re-applied");
        }
        self.props.sources = sources;
    }

    /// Seek and resume playback. False when there is no live engine.
    pub fn seek_to(&self, time: f64) -> bool {
        self.engine
            .with(|engine| {
                engine.seek(time);
                engine.play();
            })
            .is_some()
    }

    /// Seek to the start of chapter `index`
    pub fn seek_to_chapter(&self, index: usize) -> bool {
        match self.props.chapters.get(index) {
            Some(chapter) => self.seek_to(chapter.start_time),
            None => false,
        }
    }

    /// Wait for the caption loader to finish and return its report.
    ///
    /// `None` when no loader ran.
    pub async fn caption_report(&mut self) -> Option<LoadReport> {
        if let Some(task) = self.caption_task.take() {
            match task.await {
                Ok(report) => self.report = Some(report),
                Err(e) => tracing::error!(session = %self.id, error = %e, "caption loader task failed"),
            }
        }
        self.report.clone()
    }

    /// Dispose the engine, then release every caption resource.
    ///
    /// An in-flight caption load is not cancelled; it observes the empty
    /// engine slot and stops without attaching. Calling this twice is a
    /// no-op.
    pub fn dispose(&mut self) {
        if self.state == SessionState::Disposed {
            return;
        }
        if let Some(mut engine) = self.engine.take() {
            engine.dispose();
        }
        let count = self.ledger.release_all();
        self.sink.emit(SessionEvent::ResourcesReleased { count });
        self.events = None;
        self.transition(SessionState::Disposed);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn props(&self) -> &PlayerProps {
        &self.props
    }

    pub fn title(&self) -> Option<&str> {
        self.props.title.as_deref()
    }

    /// Chapters for static display
    pub fn chapters(&self) -> &[Chapter] {
        self.tracker.chapters()
    }

    pub fn active_chapter(&self) -> Option<Chapter> {
        self.tracker.active()
    }

    pub fn subscribe_chapter(&self) -> watch::Receiver<Option<Chapter>> {
        self.tracker.subscribe()
    }

    /// Run `f` against the live engine
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut E) -> R) -> Option<R> {
        self.engine.with(f)
    }

    /// Caption resources currently held
    pub fn resource_count(&self) -> usize {
        self.ledger.len()
    }
}

impl<E, F, A> Drop for PlaybackSession<E, F, A>
where
    E: PlaybackEngine,
    F: CaptionFetcher,
    A: ResourceAllocator,
{
    fn drop(&mut self) {
        self.dispose();
    }
}
