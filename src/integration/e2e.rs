//! End-to-end session tests
//!
//! Sessions and players wired to the mock engine and gated fetcher, driven
//! through engine events the way a page would see them.

use std::sync::atomic::Ordering;

use crate::engine::{EngineEvent, PlaybackEngine};
use crate::error::PlayerError;
use crate::integration::fixtures::*;
use crate::observe::SessionEvent;
use crate::player::{PlayerProps, UpdateOutcome};
use crate::session::SessionState;
use crate::types::{CaptionSpec, Chapter, ConfigurationAmbiguity};

fn ready(session: &mut MockSession, harness: &Harness) {
    session.initialize(harness.factory.as_ref()).unwrap();
    session.handle_event(EngineEvent::Ready);
    assert_eq!(session.state(), SessionState::Ready);
}

fn at(session: &mut MockSession, time: f64, event: EngineEvent) -> Option<String> {
    session.with_engine(|e| e.set_time(time));
    session.handle_event(event);
    session.active_chapter().map(|c| c.title)
}

#[tokio::test]
async fn test_failed_caption_is_skipped_in_order() {
    let fetcher = GatedFetcher::new()
        .with_file("/captions-en.srt", SAMPLE_SRT)
        .with_file("/captions-fr.srt", SAMPLE_SRT);
    let harness = Harness::new(MockEngineFactory::new(), fetcher);
    let mut session = harness.session(sample_props());
    ready(&mut session, &harness);

    let report = session.caption_report().await.unwrap();

    assert_eq!(harness.log().track_labels(), vec!["English", "French"]);
    assert_eq!(harness.log().track_defaults(), vec![true, false]);
    assert_eq!(report.attached, vec![0, 2]);
    assert_eq!(report.failed, vec![1]);
    assert_eq!(session.resource_count(), 2);
    assert_eq!(harness.store.len(), 2);

    let failed = harness
        .sink
        .matching(|e| matches!(e, SessionEvent::CaptionFetchFailed { .. }));
    assert_eq!(failed.len(), 1);
    assert!(matches!(
        &failed[0],
        SessionEvent::CaptionFetchFailed { index: 1, location, .. } if location == "/captions-es.srt"
    ));
}

#[tokio::test]
async fn test_captions_fetched_one_at_a_time() {
    let harness = Harness::new(MockEngineFactory::new(), sample_fetcher());
    let mut session = harness.session(sample_props());
    ready(&mut session, &harness);
    session.caption_report().await;

    assert_eq!(
        harness.fetcher.started(),
        vec!["/captions-en.srt", "/captions-es.srt", "/captions-fr.srt"]
    );
    assert_eq!(harness.fetcher.max_in_flight(), 1);
}

#[tokio::test]
async fn test_attached_tracks_are_webvtt_blobs() {
    let harness = Harness::new(MockEngineFactory::new(), sample_fetcher());
    let mut session = harness.session(sample_props());
    ready(&mut session, &harness);
    session.caption_report().await;

    let tracks = harness.log().tracks.lock().clone();
    assert_eq!(tracks.len(), 3);
    for (track, manual_cleanup) in &tracks {
        assert!(!manual_cleanup);
        let object = harness.store.resolve(&track.src).unwrap();
        assert_eq!(object.mime_type, "text/vtt");
        assert!(object.data.starts_with(b"WEBVTT\n\n00:00:01.000 --> 00:00:04.000"));
    }
    assert_eq!(tracks[1].0.srclang, "es");
}

#[tokio::test]
async fn test_dispose_releases_every_handle() {
    let harness = Harness::new(MockEngineFactory::new(), sample_fetcher());
    let mut session = harness.session(sample_props());
    ready(&mut session, &harness);
    session.caption_report().await;
    assert_eq!(harness.store.len(), 3);

    session.dispose();

    assert_eq!(session.state(), SessionState::Disposed);
    assert_eq!(session.resource_count(), 0);
    assert!(harness.store.is_empty());
    assert_eq!(harness.store.memory_bytes(), 0);
    assert_eq!(harness.log().disposed.load(Ordering::SeqCst), 1);
    assert!(harness
        .sink
        .events()
        .contains(&SessionEvent::ResourcesReleased { count: 3 }));

    // A second dispose releases nothing more and does not reach the engine
    session.dispose();
    assert_eq!(harness.log().disposed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fetch_completing_after_dispose_attaches_nothing() {
    let fetcher = sample_fetcher().with_gate("/captions-es.srt");
    let harness = Harness::new(MockEngineFactory::new(), fetcher);
    let mut session = harness.session(sample_props());
    ready(&mut session, &harness);

    let fetcher = harness.fetcher.clone();
    settle(|| fetcher.started().len() == 2).await;
    assert_eq!(harness.log().track_labels(), vec!["English"]);

    session.dispose();
    assert!(harness.store.is_empty());

    harness.fetcher.release("/captions-es.srt");
    let report = session.caption_report().await.unwrap();

    assert!(report.abandoned);
    assert_eq!(report.attached, vec![0]);
    assert_eq!(report.dropped, vec![1]);
    assert_eq!(harness.log().track_labels(), vec!["English"]);
    assert_eq!(harness.fetcher.started().len(), 2);
    assert!(harness.store.is_empty());
    assert_eq!(session.resource_count(), 0);
}

#[tokio::test]
async fn test_chapter_follows_timing_events() {
    let harness = Harness::new(MockEngineFactory::new(), GatedFetcher::new());
    let props = PlayerProps::new(sample_sources()).with_chapters(sample_chapters());
    let mut session = harness.session(props);
    ready(&mut session, &harness);
    let mut rx = session.subscribe_chapter();

    assert_eq!(
        at(&mut session, 45.0, EngineEvent::TimeUpdate).as_deref(),
        Some("Meeting the Characters")
    );
    assert!(rx.has_changed().unwrap());
    assert_eq!(
        rx.borrow_and_update().as_ref().map(|c| c.start_time),
        Some(30.0)
    );

    assert_eq!(
        at(&mut session, 95.0, EngineEvent::Seeking).as_deref(),
        Some("The Conflict")
    );
    assert_eq!(
        at(&mut session, 5.0, EngineEvent::Seeked).as_deref(),
        Some("Opening Credits")
    );

    // Same chapter again: no new notification
    rx.borrow_and_update();
    at(&mut session, 6.0, EngineEvent::TimeUpdate);
    assert!(!rx.has_changed().unwrap());

    let changes = harness
        .sink
        .matching(|e| matches!(e, SessionEvent::ChapterChanged { .. }));
    assert_eq!(changes.len(), 3);
}

#[tokio::test]
async fn test_timing_events_before_ready_are_ignored() {
    let harness = Harness::new(MockEngineFactory::new(), GatedFetcher::new());
    let props = PlayerProps::new(sample_sources()).with_chapters(sample_chapters());
    let mut session = harness.session(props);
    session.initialize(harness.factory.as_ref()).unwrap();

    assert_eq!(at(&mut session, 45.0, EngineEvent::TimeUpdate), None);
}

#[tokio::test]
async fn test_equal_start_times_later_chapter_wins() {
    let harness = Harness::new(MockEngineFactory::new(), GatedFetcher::new());
    let props = PlayerProps::new(sample_sources()).with_chapters(vec![
        Chapter::new(0.0, "A"),
        Chapter::new(30.0, "B"),
        Chapter::new(30.0, "C"),
    ]);
    let mut session = harness.session(props);
    ready(&mut session, &harness);

    assert_eq!(at(&mut session, 30.0, EngineEvent::TimeUpdate).as_deref(), Some("C"));
}

#[tokio::test]
async fn test_chapter_click_seeks_and_plays() {
    let harness = Harness::new(MockEngineFactory::new(), GatedFetcher::new());
    let props = PlayerProps::new(sample_sources()).with_chapters(sample_chapters());
    let mut session = harness.session(props);
    ready(&mut session, &harness);

    assert!(session.seek_to_chapter(2));
    assert!(!session.seek_to_chapter(7));

    assert_eq!(*harness.log().seeks.lock(), vec![90.0]);
    assert_eq!(harness.log().plays.load(Ordering::SeqCst), 1);
    assert_eq!(session.with_engine(|e| e.current_time()), Some(90.0));
}

#[tokio::test]
async fn test_markers_added_only_with_capability() {
    let props = || PlayerProps::new(sample_sources()).with_chapters(sample_chapters());

    let harness = Harness::new(MockEngineFactory::new(), GatedFetcher::new());
    let mut session = harness.session(props());
    ready(&mut session, &harness);
    let markers = harness.log().markers.lock().clone();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].1.len(), 3);
    assert_eq!(markers[0].1[2].time, 90.0);
    assert_eq!(markers[0].1[2].text, "The Conflict");
    assert!(harness
        .sink
        .events()
        .contains(&SessionEvent::MarkersAdded { count: 3 }));

    let harness = Harness::new(MockEngineFactory::new().without_markers(), GatedFetcher::new());
    let mut session = harness.session(props());
    ready(&mut session, &harness);
    assert!(harness.log().markers.lock().is_empty());
    assert!(harness
        .sink
        .matching(|e| matches!(e, SessionEvent::MarkersAdded { .. }))
        .is_empty());
}

#[tokio::test]
async fn test_engine_errors_are_reported() {
    let harness = Harness::new(MockEngineFactory::new(), GatedFetcher::new());
    let mut session = harness.session(PlayerProps::new(sample_sources()));
    session.initialize(harness.factory.as_ref()).unwrap();

    session.with_engine(|e| e.emit(EngineEvent::Error("MEDIA_ERR_NETWORK".to_string())));
    assert_eq!(session.pump(), 1);

    assert!(harness.sink.events().contains(&SessionEvent::EngineError {
        message: "MEDIA_ERR_NETWORK".to_string()
    }));
    assert_eq!(session.state(), SessionState::Initializing);
}

#[tokio::test]
async fn test_engine_creation_failure() {
    let harness = Harness::new(MockEngineFactory::new().failing(), GatedFetcher::new());
    let mut session = harness.session(PlayerProps::new(sample_sources()));

    let err = session.initialize(harness.factory.as_ref()).unwrap_err();
    assert!(matches!(err, PlayerError::Engine(_)));
    assert_eq!(session.state(), SessionState::Uninitialized);
}

#[tokio::test]
async fn test_ambiguities_are_reported_not_rejected() {
    let harness = Harness::new(MockEngineFactory::new(), sample_fetcher());
    let mut captions = sample_captions();
    captions[0].default = true;
    captions[2].default = true;
    let props = PlayerProps::new(sample_sources())
        .with_captions(captions)
        .with_chapters(vec![Chapter::new(30.0, "B"), Chapter::new(0.0, "A")]);
    let mut session = harness.session(props);
    ready(&mut session, &harness);
    session.caption_report().await;

    let ambiguities: Vec<ConfigurationAmbiguity> = harness
        .sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::Ambiguity(a) => Some(a),
            _ => None,
        })
        .collect();
    assert_eq!(ambiguities.len(), 2);
    assert_eq!(harness.log().track_defaults(), vec![true, false, true]);
}

#[tokio::test]
async fn test_player_without_sources_creates_no_engine() {
    let harness = Harness::new(MockEngineFactory::new(), GatedFetcher::new());
    let mut player = harness.player();
    player.mount(PlayerProps::new(Vec::new())).unwrap();

    let session = player.session().unwrap();
    assert_eq!(session.state(), SessionState::Uninitialized);
    assert_eq!(harness.log().created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_player_same_sources_refreshes() {
    let harness = Harness::new(MockEngineFactory::new(), GatedFetcher::new());
    let mut player = harness.player();
    let props = PlayerProps::new(sample_sources());
    assert_eq!(player.update(props.clone()).unwrap(), UpdateOutcome::Mounted);
    let id = player.session().unwrap().id();

    let retitled = props.clone().with_title("Renamed");
    assert_eq!(player.update(retitled).unwrap(), UpdateOutcome::Refreshed);

    assert_eq!(player.session().unwrap().id(), id);
    assert_eq!(harness.log().created.load(Ordering::SeqCst), 1);
    assert_eq!(harness.log().sources.lock().len(), 2);
}

#[tokio::test]
async fn test_player_new_sources_replace_session() {
    let harness = Harness::new(MockEngineFactory::new(), sample_fetcher());
    let mut player = harness.player();
    player.mount(sample_props()).unwrap();
    {
        let session = player.session_mut().unwrap();
        session.handle_event(EngineEvent::Ready);
        session.caption_report().await;
    }
    let first = player.session().unwrap().id();
    assert_eq!(harness.store.len(), 3);

    // Equal contents, different list
    let outcome = player.update(sample_props()).unwrap();

    assert_eq!(outcome, UpdateOutcome::Replaced);
    assert_ne!(player.session().unwrap().id(), first);
    assert_eq!(harness.log().created.load(Ordering::SeqCst), 2);
    assert_eq!(harness.log().disposed.load(Ordering::SeqCst), 1);
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_player_config_change_replaces_session() {
    let harness = Harness::new(MockEngineFactory::new(), GatedFetcher::new());
    let mut player = harness.player();
    let props = PlayerProps::new(sample_sources());
    player.mount(props.clone()).unwrap();

    let outcome = player
        .update(props.with_captions(vec![CaptionSpec::new("/x.srt", "de", "German")]))
        .unwrap();
    assert_eq!(outcome, UpdateOutcome::Replaced);
}

#[tokio::test]
async fn test_player_drop_disposes_session() {
    let harness = Harness::new(MockEngineFactory::new(), sample_fetcher());
    {
        let mut player = harness.player();
        player.mount(sample_props()).unwrap();
        let session = player.session_mut().unwrap();
        session.handle_event(EngineEvent::Ready);
        session.caption_report().await;
        assert_eq!(harness.store.len(), 3);
    }
    assert!(harness.store.is_empty());
    assert_eq!(harness.log().disposed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_engine_options_carry_display_and_poster() {
    let harness = Harness::new(MockEngineFactory::new(), GatedFetcher::new());
    let mut player = harness.player();
    player
        .mount(PlayerProps::new(sample_sources()).with_poster("poster.jpg"))
        .unwrap();

    let options = harness.log().options.lock().clone();
    assert_eq!(options[0].poster.as_deref(), Some("poster.jpg"));
    assert_eq!(options[0].display.height, "400px");
    assert_eq!(harness.log().sources.lock()[0].len(), 2);
}
