//! Chapter tracking
//!
//! Derives the active chapter from the playback position. The lookup runs
//! in full on every timing event; nothing is cached between calls.

use std::sync::Arc;
use tokio::sync::watch;

use crate::types::Chapter;

/// Find the chapter playing at `current_time`.
///
/// Scans backwards and returns the last chapter whose start time is at or
/// before `current_time`, so of two chapters sharing a start time the later
/// one wins. When `current_time` precedes every chapter the first chapter is
/// returned. `None` only for an empty list.
pub fn active_chapter(chapters: &[Chapter], current_time: f64) -> Option<&Chapter> {
    chapters
        .iter()
        .rev()
        .find(|c| c.start_time <= current_time)
        .or_else(|| chapters.first())
}

/// Publishes the active chapter for a fixed chapter list
#[derive(Debug)]
pub struct ChapterTracker {
    chapters: Arc<[Chapter]>,
    active: watch::Sender<Option<Chapter>>,
}

impl ChapterTracker {
    pub fn new(chapters: Arc<[Chapter]>) -> Self {
        let (active, _) = watch::channel(None);
        Self { chapters, active }
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Recompute the active chapter for `current_time`.
    ///
    /// With no chapters the published value is left untouched. Returns
    /// true when the active chapter changed.
    pub fn update(&self, current_time: f64) -> bool {
        if self.chapters.is_empty() {
            return false;
        }
        let next = active_chapter(&self.chapters, current_time).cloned();
        self.active.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        })
    }

    /// Current value
    pub fn active(&self) -> Option<Chapter> {
        self.active.borrow().clone()
    }

    /// Watch the active chapter
    pub fn subscribe(&self) -> watch::Receiver<Option<Chapter>> {
        self.active.subscribe()
    }
}

/// A timeline marker for one chapter
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub time: f64,
    pub text: String,
    pub overlay_text: String,
}

/// One marker per chapter, titled after the chapter
pub fn chapter_markers(chapters: &[Chapter]) -> Vec<Marker> {
    chapters
        .iter()
        .map(|c| Marker {
            time: c.start_time,
            text: c.title.clone(),
            overlay_text: c.title.clone(),
        })
        .collect()
}
