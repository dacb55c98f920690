//! Player host
//!
//! Mounts, updates and unmounts playback sessions as the embedding page's
//! properties change. The source list is compared by identity: a new list
//! (or any other changed property) replaces the session, while the same list
//! is only pushed to the running engine again.

use std::sync::Arc;

use crate::captions::CaptionFetcher;
use crate::config::{DisplayConfig, MarkerStyle};
use crate::engine::EngineFactory;
use crate::error::Result;
use crate::resource::ResourceAllocator;
use crate::session::{PlaybackSession, SessionDeps};
use crate::types::{CaptionSpec, Chapter, SourceDescriptor};

/// Everything the page hands to the player
#[derive(Debug, Clone)]
pub struct PlayerProps {
    pub title: Option<String>,
    pub sources: Arc<[SourceDescriptor]>,
    pub poster: Option<String>,
    pub display: DisplayConfig,
    pub chapters: Arc<[Chapter]>,
    pub captions: Arc<[CaptionSpec]>,
    pub marker_style: MarkerStyle,
}

impl PlayerProps {
    pub fn new(sources: Vec<SourceDescriptor>) -> Self {
        Self {
            title: None,
            sources: sources.into(),
            poster: None,
            display: DisplayConfig::default(),
            chapters: Vec::<Chapter>::new().into(),
            captions: Vec::<CaptionSpec>::new().into(),
            marker_style: MarkerStyle::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_poster(mut self, poster: impl Into<String>) -> Self {
        self.poster = Some(poster.into());
        self
    }

    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    pub fn with_chapters(mut self, chapters: Vec<Chapter>) -> Self {
        self.chapters = chapters.into();
        self
    }

    pub fn with_captions(mut self, captions: Vec<CaptionSpec>) -> Self {
        self.captions = captions.into();
        self
    }

    /// Same source list object, not merely equal contents
    pub fn same_sources(&self, other: &PlayerProps) -> bool {
        Arc::ptr_eq(&self.sources, &other.sources)
    }

    /// Every session-relevant property other than the sources matches.
    /// The title only affects rendering and is ignored.
    pub fn same_configuration(&self, other: &PlayerProps) -> bool {
        self.poster == other.poster
            && self.display == other.display
            && self.marker_style == other.marker_style
            && Arc::ptr_eq(&self.chapters, &other.chapters)
            && Arc::ptr_eq(&self.captions, &other.captions)
    }
}

/// What an update did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Nothing was mounted; a session was created
    Mounted,
    /// Sources were re-applied to the existing engine
    Refreshed,
    /// The old session was disposed and a new one created
    Replaced,
}

type SessionOf<Fa, F, A> = PlaybackSession<<Fa as EngineFactory>::Engine, F, A>;

pub struct Player<Fa: EngineFactory, F: CaptionFetcher, A: ResourceAllocator> {
    factory: Arc<Fa>,
    deps: SessionDeps<F, A>,
    session: Option<SessionOf<Fa, F, A>>,
}

impl<Fa, F, A> Player<Fa, F, A>
where
    Fa: EngineFactory,
    F: CaptionFetcher,
    A: ResourceAllocator,
{
    pub fn new(factory: Arc<Fa>, deps: SessionDeps<F, A>) -> Self {
        Self {
            factory,
            deps,
            session: None,
        }
    }

    /// Create a session for `props`. An empty source list leaves the session
    /// uninitialized with no engine. Any mounted session is disposed first.
    pub fn mount(&mut self, props: PlayerProps) -> Result<()> {
        self.unmount();

        let mut session = PlaybackSession::new(props, self.deps.clone());
        if session.props().sources.is_empty() {
            tracing::debug!(session = %session.id(), "no sources, engine not created");
        } else {
            session.initialize(self.factory.as_ref())?;
        }
        self.session = Some(session);
        Ok(())
    }

    /// Apply new properties
    pub fn update(&mut self, props: PlayerProps) -> Result<UpdateOutcome> {
        let unchanged = match self.session.as_ref() {
            None => {
                self.mount(props)?;
                return Ok(UpdateOutcome::Mounted);
            }
            Some(session) => {
                let current = session.props();
                current.same_sources(&props) && current.same_configuration(&props)
            }
        };

        if unchanged {
            if let Some(session) = self.session.as_mut() {
                session.refresh_sources(props.sources.clone());
            }
            return Ok(UpdateOutcome::Refreshed);
        }

        self.mount(props)?;
        Ok(UpdateOutcome::Replaced)
    }

    /// Dispose the current session, if any
    pub fn unmount(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.dispose();
        }
    }

    pub fn session(&self) -> Option<&SessionOf<Fa, F, A>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut SessionOf<Fa, F, A>> {
        self.session.as_mut()
    }
}

impl<Fa, F, A> Drop for Player<Fa, F, A>
where
    Fa: EngineFactory,
    F: CaptionFetcher,
    A: ResourceAllocator,
{
    fn drop(&mut self) {
        self.unmount();
    }
}
