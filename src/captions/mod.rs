//! Caption loading
//!
//! - [`fetch`]: reading raw caption bytes
//! - [`loader`]: ordered fetch, convert, register and attach

pub mod fetch;
pub mod loader;

pub use fetch::{CaptionFetcher, SourceFetcher};
pub use loader::{resolve_default, CaptionLoader, LoadReport, TrackTarget};
