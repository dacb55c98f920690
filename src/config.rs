//! Player configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Preload policy handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preload {
    Auto,
    #[default]
    Metadata,
    None,
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// CSS width, e.g. "100%"
    pub width: String,

    /// CSS height, e.g. "400px"
    pub height: String,

    /// Show engine controls
    pub controls: bool,

    /// Start playing as soon as sources are set
    pub autoplay: bool,

    pub preload: Preload,

    /// Scale with the container
    pub fluid: bool,

    pub responsive: bool,

    /// Selectable playback speeds
    pub playback_rates: Vec<f64>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: "100%".to_string(),
            height: "400px".to_string(),
            controls: true,
            autoplay: false,
            preload: Preload::Metadata,
            fluid: true,
            responsive: true,
            playback_rates: vec![0.5, 1.0, 1.25, 1.5, 2.0],
        }
    }
}

/// Timeline marker appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub width: String,
    pub background_color: String,
    pub border_radius: String,
    pub opacity: f64,
    /// Show the chapter title on hover
    pub tip_display: bool,
    /// Show the overlay text while playing through a marker
    pub break_overlay: bool,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            width: "10px".to_string(),
            background_color: "#FF6B6B".to_string(),
            border_radius: "2px".to_string(),
            opacity: 0.8,
            tip_display: true,
            break_overlay: false,
        }
    }
}

/// Caption fetch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,

    /// Directory relative caption paths are resolved against
    pub base_dir: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            base_dir: None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Filter directive used when RUST_LOG is not set
    pub fn filter_directive(&self) -> String {
        format!("vod_player={}", self.level)
    }
}
