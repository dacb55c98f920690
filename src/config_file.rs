//! Player file support
//!
//! Loads a player description (sources, chapters, captions and display
//! settings) from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{DisplayConfig, FetchConfig, LogFormat, LoggingConfig, MarkerStyle, Preload};
use crate::error::{PlayerError, Result};
use crate::player::PlayerProps;
use crate::types::{CaptionKind, CaptionSpec, Chapter, SourceDescriptor};

/// Player file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerFile {
    /// Heading shown above the player
    pub title: Option<String>,
    /// Poster image location
    pub poster: Option<String>,
    /// Display settings
    pub display: Option<DisplaySettings>,
    /// Media sources, in preference order
    pub sources: Vec<SourceDescriptor>,
    /// Chapters, ordered by start time
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    /// Caption tracks, in attach order
    #[serde(default)]
    pub captions: Vec<CaptionSpec>,
    /// Timeline marker settings
    pub markers: Option<MarkerSettings>,
    /// Caption fetch settings
    pub fetch: Option<FetchSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub width: Option<String>,
    pub height: Option<String>,
    pub controls: Option<bool>,
    pub autoplay: Option<bool>,
    pub preload: Option<Preload>,
    pub fluid: Option<bool>,
    pub responsive: Option<bool>,
    pub playback_rates: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkerSettings {
    pub width: Option<String>,
    pub background_color: Option<String>,
    pub border_radius: Option<String>,
    pub opacity: Option<f64>,
    pub tip_display: Option<bool>,
    pub break_overlay: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchSettings {
    /// HTTP timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Directory relative caption paths resolve against
    pub base_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<LogFormat>,
}

impl PlayerFile {
    /// Load a player file from TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: PlayerFile = toml::from_str(content)?;
        if file.sources.iter().any(|s| s.src.trim().is_empty()) {
            return Err(PlayerError::Config("source with empty src".to_string()));
        }
        if let Some(c) = file.captions.iter().find(|c| c.src.trim().is_empty()) {
            return Err(PlayerError::Config(format!("caption '{}' has empty src", c.label)));
        }
        if let Some(c) = file.chapters.iter().find(|c| !c.start_time.is_finite() || c.start_time < 0.0) {
            return Err(PlayerError::Config(format!(
                "chapter '{}' has invalid start time {}",
                c.title, c.start_time
            )));
        }
        Ok(file)
    }

    /// Save the player file as TOML
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// The sample page: an HLS stream with six chapters and two caption
    /// languages
    pub fn default_config() -> Self {
        Self {
            title: Some("HLS Video Stream - Big Buck Bunny".to_string()),
            poster: Some(
                "https://upload.wikimedia.org/wikipedia/commons/thumb/c/c5/Big_buck_bunny_poster_big.jpg/320px-Big_buck_bunny_poster_big.jpg"
                    .to_string(),
            ),
            display: Some(DisplaySettings {
                width: Some("100%".to_string()),
                height: Some("500px".to_string()),
                controls: Some(true),
                autoplay: Some(false),
                preload: Some(Preload::Metadata),
                ..Default::default()
            }),
            sources: vec![SourceDescriptor::new(
                "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8",
                "application/x-mpegURL",
                "HLS - Big Buck Bunny",
            )],
            chapters: vec![
                Chapter::new(0.0, "Opening Credits")
                    .with_description("The story begins with our hero Big Buck Bunny"),
                Chapter::new(30.0, "Meeting the Characters")
                    .with_description("Introduction to the woodland creatures"),
                Chapter::new(90.0, "The Conflict")
                    .with_description("Trouble starts in the peaceful forest"),
                Chapter::new(150.0, "The Chase")
                    .with_description("Action-packed sequence through the forest"),
                Chapter::new(240.0, "Resolution").with_description("How our hero saves the day"),
                Chapter::new(300.0, "Ending Credits")
                    .with_description("The story concludes with a happy ending"),
            ],
            captions: vec![
                CaptionSpec::new("/captions-en.srt", "en", "English").with_default(true),
                CaptionSpec::new("/captions-es.srt", "es", "Spanish").with_kind(CaptionKind::Subtitles),
            ],
            markers: None,
            fetch: Some(FetchSettings {
                timeout_secs: Some(30),
                base_dir: None,
            }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some(LogFormat::Pretty),
            }),
        }
    }

    pub fn display_config(&self) -> DisplayConfig {
        let d = self.display.clone().unwrap_or_default();
        let defaults = DisplayConfig::default();
        DisplayConfig {
            width: d.width.unwrap_or(defaults.width),
            height: d.height.unwrap_or(defaults.height),
            controls: d.controls.unwrap_or(defaults.controls),
            autoplay: d.autoplay.unwrap_or(defaults.autoplay),
            preload: d.preload.unwrap_or(defaults.preload),
            fluid: d.fluid.unwrap_or(defaults.fluid),
            responsive: d.responsive.unwrap_or(defaults.responsive),
            playback_rates: d.playback_rates.unwrap_or(defaults.playback_rates),
        }
    }

    pub fn marker_style(&self) -> MarkerStyle {
        let m = self.markers.clone().unwrap_or_default();
        let defaults = MarkerStyle::default();
        MarkerStyle {
            width: m.width.unwrap_or(defaults.width),
            background_color: m.background_color.unwrap_or(defaults.background_color),
            border_radius: m.border_radius.unwrap_or(defaults.border_radius),
            opacity: m.opacity.unwrap_or(defaults.opacity),
            tip_display: m.tip_display.unwrap_or(defaults.tip_display),
            break_overlay: m.break_overlay.unwrap_or(defaults.break_overlay),
        }
    }

    /// Fetch settings. A relative `base_dir` resolves against `file_dir`.
    pub fn fetch_config(&self, file_dir: Option<&Path>) -> FetchConfig {
        let f = self.fetch.clone().unwrap_or_default();
        let base_dir = match (f.base_dir, file_dir) {
            (Some(dir), Some(root)) if dir.is_relative() => Some(root.join(dir)),
            (Some(dir), _) => Some(dir),
            (None, root) => root.map(Path::to_path_buf),
        };
        FetchConfig {
            timeout_secs: f.timeout_secs.unwrap_or(FetchConfig::default().timeout_secs),
            base_dir,
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        self.logging
            .as_ref()
            .map(|l| LoggingConfig {
                level: l.level.clone(),
                format: l.format.unwrap_or_default(),
            })
            .unwrap_or_default()
    }

    /// Convert to session properties
    pub fn into_props(self) -> PlayerProps {
        let display = self.display_config();
        let marker_style = self.marker_style();
        PlayerProps {
            title: self.title,
            sources: self.sources.into(),
            poster: self.poster,
            display,
            chapters: self.chapters.into(),
            captions: self.captions.into(),
            marker_style,
        }
    }
}

/// Write the default player file to `path`
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    PlayerFile::default_config().to_file(path)
}
