//! VOD player control
//!
//! Drives a playback engine for a video-on-demand page: SRT captions are
//! fetched and converted to WebVTT, held as in-process blob resources that
//! are released with the session, and the active chapter is tracked from the
//! playback position.

pub mod captions;
pub mod chapters;
pub mod config;
pub mod config_file;
pub mod engine;
pub mod error;
pub mod observe;
pub mod player;
pub mod resource;
pub mod session;
pub mod subtitle;
pub mod types;


pub use error::{FetchError, PlayerError, Result};
pub use player::{Player, PlayerProps, UpdateOutcome};
pub use session::{PlaybackSession, SessionDeps, SessionState};
