//! Test fixtures for session tests
//!
//! A recording engine, a fetcher whose responses can be held back, and
//! sample page data.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::captions::CaptionFetcher;
use crate::chapters::Marker;
use crate::config::MarkerStyle;
use crate::engine::{
    EngineEvent, EngineFactory, EngineOptions, EventSender, MarkerSurface, PlaybackEngine,
    RemoteTextTrack,
};
use crate::error::{FetchError, PlayerError, Result};
use crate::observe::RecordingSink;
use crate::player::{Player, PlayerProps};
use crate::resource::ObjectStore;
use crate::session::{PlaybackSession, SessionDeps};
use crate::types::{CaptionSpec, Chapter, SourceDescriptor};

pub const SAMPLE_SRT: &str = "1\n00:00:01,000 --> 00:00:04,000\nHello\n\n2\n00:00:05,000 --> 00:00:08,000\nWorld\n";

/// Everything the mock engines did, shared across engine instances
#[derive(Default)]
pub struct EngineLog {
    pub created: AtomicUsize,
    pub disposed: AtomicUsize,
    pub plays: AtomicUsize,
    pub sources: Mutex<Vec<Vec<SourceDescriptor>>>,
    pub tracks: Mutex<Vec<(RemoteTextTrack, bool)>>,
    pub markers: Mutex<Vec<(MarkerStyle, Vec<Marker>)>>,
    pub seeks: Mutex<Vec<f64>>,
    pub options: Mutex<Vec<EngineOptions>>,
}

impl EngineLog {
    pub fn track_labels(&self) -> Vec<String> {
        self.tracks.lock().iter().map(|(t, _)| t.label.clone()).collect()
    }

    pub fn track_defaults(&self) -> Vec<bool> {
        self.tracks.lock().iter().map(|(t, _)| t.default).collect()
    }
}

pub struct MockEngine {
    log: Arc<EngineLog>,
    events: EventSender,
    time: f64,
    markers: bool,
}

impl MockEngine {
    /// Set the playback position without emitting anything
    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}

impl PlaybackEngine for MockEngine {
    fn set_sources(&mut self, sources: &[SourceDescriptor]) {
        self.log.sources.lock().push(sources.to_vec());
    }

    fn play(&mut self) {
        self.log.plays.fetch_add(1, Ordering::SeqCst);
    }

    fn pause(&mut self) {}

    fn seek(&mut self, time: f64) {
        self.time = time;
        self.log.seeks.lock().push(time);
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn add_remote_text_track(&mut self, track: RemoteTextTrack, manual_cleanup: bool) {
        self.log.tracks.lock().push((track, manual_cleanup));
    }

    fn marker_surface(&mut self) -> Option<&mut dyn MarkerSurface> {
        if self.markers {
            Some(self)
        } else {
            None
        }
    }

    fn dispose(&mut self) {
        self.log.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

impl MarkerSurface for MockEngine {
    fn add_markers(&mut self, style: &MarkerStyle, markers: Vec<Marker>) {
        self.log.markers.lock().push((style.clone(), markers));
    }
}

/// Builds [`MockEngine`]s. Engines do not signal readiness on their own.
pub struct MockEngineFactory {
    pub log: Arc<EngineLog>,
    pub markers: bool,
    pub fail: bool,
}

impl MockEngineFactory {
    pub fn new() -> Self {
        Self {
            log: Arc::new(EngineLog::default()),
            markers: true,
            fail: false,
        }
    }

    pub fn without_markers(mut self) -> Self {
        self.markers = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl EngineFactory for MockEngineFactory {
    type Engine = MockEngine;

    fn create(&self, options: &EngineOptions, events: EventSender) -> Result<MockEngine> {
        if self.fail {
            return Err(PlayerError::Engine("no playback backend".to_string()));
        }
        self.log.created.fetch_add(1, Ordering::SeqCst);
        self.log.options.lock().push(options.clone());
        Ok(MockEngine {
            log: self.log.clone(),
            events,
            time: 0.0,
            markers: self.markers,
        })
    }
}

/// Serves captions from memory. Locations not in the map fail with 404;
/// a gated location waits for [`GatedFetcher::release`].
#[derive(Default)]
pub struct GatedFetcher {
    files: HashMap<String, &'static str>,
    gates: HashMap<String, Arc<Notify>>,
    started: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl GatedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, location: &str, content: &'static str) -> Self {
        self.files.insert(location.to_string(), content);
        self
    }

    pub fn with_gate(mut self, location: &str) -> Self {
        self.gates.insert(location.to_string(), Arc::new(Notify::new()));
        self
    }

    /// Let the fetch of `location` complete
    pub fn release(&self, location: &str) {
        if let Some(gate) = self.gates.get(location) {
            gate.notify_one();
        }
    }

    /// Locations in the order their fetches started
    pub fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl CaptionFetcher for GatedFetcher {
    fn fetch(
        &self,
        location: &str,
    ) -> impl Future<Output = std::result::Result<Bytes, FetchError>> + Send {
        let result = self
            .files
            .get(location)
            .map(|s| Bytes::from_static(s.as_bytes()))
            .ok_or_else(|| FetchError::Http {
                location: location.to_string(),
                status: 404,
            });
        let gate = self.gates.get(location).cloned();
        let started = self.started.clone();
        let in_flight = self.in_flight.clone();
        let max_in_flight = self.max_in_flight.clone();
        let location = location.to_string();

        async move {
            started.lock().push(location);
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(gate) = gate {
                gate.notified().await;
            }
            tokio::task::yield_now().await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}

pub type MockSession = PlaybackSession<MockEngine, GatedFetcher, ObjectStore>;
pub type MockPlayer = Player<MockEngineFactory, GatedFetcher, ObjectStore>;

/// Shared collaborators for one test
pub struct Harness {
    pub factory: Arc<MockEngineFactory>,
    pub fetcher: Arc<GatedFetcher>,
    pub store: Arc<ObjectStore>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new(factory: MockEngineFactory, fetcher: GatedFetcher) -> Self {
        Self {
            factory: Arc::new(factory),
            fetcher: Arc::new(fetcher),
            store: Arc::new(ObjectStore::new()),
            sink: Arc::new(RecordingSink::new()),
        }
    }

    pub fn deps(&self) -> SessionDeps<GatedFetcher, ObjectStore> {
        SessionDeps {
            fetcher: self.fetcher.clone(),
            allocator: self.store.clone(),
            sink: self.sink.clone(),
        }
    }

    pub fn session(&self, props: PlayerProps) -> MockSession {
        PlaybackSession::new(props, self.deps())
    }

    pub fn player(&self) -> MockPlayer {
        Player::new(self.factory.clone(), self.deps())
    }

    pub fn log(&self) -> &EngineLog {
        &self.factory.log
    }
}

pub fn sample_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::new(
            "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8",
            "application/x-mpegURL",
            "HLS - Big Buck Bunny",
        ),
        SourceDescriptor::new(
            "https://dash.akamaized.net/akamai/bbb_30fps/bbb_30fps.mpd",
            "application/dash+xml",
            "DASH/MPD - Big Buck Bunny",
        ),
    ]
}

pub fn sample_chapters() -> Vec<Chapter> {
    vec![
        Chapter::new(0.0, "Opening Credits"),
        Chapter::new(30.0, "Meeting the Characters"),
        Chapter::new(90.0, "The Conflict"),
    ]
}

pub fn sample_captions() -> Vec<CaptionSpec> {
    vec![
        CaptionSpec::new("/captions-en.srt", "en", "English"),
        CaptionSpec::new("/captions-es.srt", "es", "Spanish"),
        CaptionSpec::new("/captions-fr.srt", "fr", "French"),
    ]
}

/// Fetcher serving every sample caption
pub fn sample_fetcher() -> GatedFetcher {
    sample_captions()
        .iter()
        .fold(GatedFetcher::new(), |f, c| f.with_file(&c.src, SAMPLE_SRT))
}

pub fn sample_props() -> PlayerProps {
    PlayerProps::new(sample_sources())
        .with_title("HLS Video Stream - Big Buck Bunny")
        .with_chapters(sample_chapters())
        .with_captions(sample_captions())
}

/// Let spawned tasks run until `done` holds
pub async fn settle(mut done: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
