//! VOD player command line
//!
//! Converts SRT captions to WebVTT, writes sample player files and runs a
//! player file against the headless engine.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vod_player::captions::{LoadReport, SourceFetcher};
use vod_player::config::{LogFormat, LoggingConfig};
use vod_player::config_file::{generate_default_config, PlayerFile};
use vod_player::engine::{HeadlessEngineFactory, PlaybackEngine};
use vod_player::observe::TracingSink;
use vod_player::resource::ObjectStore;
use vod_player::subtitle::{bytes_to_webvtt, count_cues};
use vod_player::types::Chapter;
use vod_player::{Player, PlayerError, Result, SessionDeps, SessionState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "vod-player";

#[derive(Parser, Debug)]
#[command(name = "vod-player")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an SRT file to WebVTT
    Convert {
        /// SRT input file
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a player file against the headless engine
    Play {
        /// Player file (TOML)
        config: PathBuf,

        /// Media duration in seconds
        #[arg(long, default_value_t = 360.0)]
        duration: f64,

        /// Playback step in seconds
        #[arg(long, default_value_t = 1.0)]
        tick: f64,

        /// Seek to this time before playing; repeatable
        #[arg(long)]
        seek: Vec<f64>,

        /// Print a JSON summary instead of text
        #[arg(long)]
        json: bool,
    },

    /// Write the sample player file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct ChapterVisit {
    at: f64,
    title: Option<String>,
}

#[derive(Debug, Serialize)]
struct PlaySummary {
    session: String,
    title: Option<String>,
    state: SessionState,
    captions: Option<LoadReport>,
    chapters: Vec<ChapterVisit>,
    position: f64,
    resources_released: usize,
    resources_remaining: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Convert { input, output } => {
            init_logging(&LoggingConfig::default());
            convert(&input, output.as_deref())
        }
        Command::Play {
            config,
            duration,
            tick,
            seek,
            json,
        } => {
            let file = PlayerFile::from_file(&config)?;
            init_logging(&file.logging_config());
            tracing::info!("{} v{} starting", APP_NAME, VERSION);
            play(file, config.parent(), duration, tick, &seek, json).await
        }
        Command::InitConfig { path } => {
            init_logging(&LoggingConfig::default());
            generate_default_config(&path)?;
            tracing::info!(path = %path.display(), "default player file written");
            Ok(())
        }
    }
}

/// Initialize logging with tracing. Logs go to stderr so converted output
/// can be piped.
fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.filter_directive().into());

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn convert(input: &Path, output: Option<&Path>) -> Result<()> {
    let bytes = std::fs::read(input)?;
    let vtt = bytes_to_webvtt(&bytes);
    tracing::info!(input = %input.display(), cues = count_cues(&vtt), "converted SRT to WebVTT");

    match output {
        Some(path) => std::fs::write(path, vtt)?,
        None => println!("{}", vtt),
    }
    Ok(())
}

async fn play(
    file: PlayerFile,
    file_dir: Option<&Path>,
    duration: f64,
    tick: f64,
    seeks: &[f64],
    json: bool,
) -> Result<()> {
    if !(tick > 0.0) || !(duration > 0.0) {
        return Err(PlayerError::Config(
            "--tick and --duration must be positive".to_string(),
        ));
    }

    let store = Arc::new(ObjectStore::new());
    let fetcher = SourceFetcher::new(&file.fetch_config(file_dir))?;
    let factory = HeadlessEngineFactory::new()
        .with_store(store.clone())
        .with_duration(duration);
    let deps = SessionDeps {
        fetcher: Arc::new(fetcher),
        allocator: store.clone(),
        sink: Arc::new(TracingSink),
    };

    let mut player = Player::new(Arc::new(factory), deps);
    player.mount(file.into_props())?;

    let Some(session) = player.session_mut() else {
        return Ok(());
    };
    if session.state() == SessionState::Uninitialized {
        tracing::warn!("player file has no sources, nothing to play");
        return Ok(());
    }

    session.pump();
    if !json {
        if let Some(title) = session.title() {
            println!("{}", title);
        }
        for (index, chapter) in session.chapters().iter().enumerate() {
            println!("  {:>2}. [{:>7.1}s] {}", index + 1, chapter.start_time, chapter.title);
        }
    }

    let captions = session.caption_report().await;
    if let (Some(report), false) = (&captions, json) {
        println!(
            "captions: {} attached, {} failed",
            report.attached.len(),
            report.failed.len()
        );
    }

    let mut chapter_rx = session.subscribe_chapter();
    let mut visits = Vec::new();
    let mut record = |at: f64, rx: &mut watch::Receiver<Option<Chapter>>| {
        if rx.has_changed().unwrap_or(false) {
            let title = rx.borrow_and_update().as_ref().map(|c| c.title.clone());
            if !json {
                println!("[{:>7.1}s] chapter: {}", at, title.as_deref().unwrap_or("-"));
            }
            visits.push(ChapterVisit { at, title });
        }
    };

    for &target in seeks {
        session.seek_to(target);
        session.pump();
        let at = session.with_engine(|e| e.current_time()).unwrap_or(target);
        record(at, &mut chapter_rx);
    }

    session.with_engine(|e| e.play());
    while session.with_engine(|e| e.is_playing()).unwrap_or(false) {
        session.with_engine(|e| e.advance(tick));
        session.pump();
        let at = session.with_engine(|e| e.current_time()).unwrap_or(0.0);
        record(at, &mut chapter_rx);
    }

    let position = session.with_engine(|e| e.current_time()).unwrap_or(0.0);
    let id = session.id().to_string();
    let title = session.title().map(str::to_string);
    let resources_released = session.resource_count();

    player.unmount();

    let summary = PlaySummary {
        session: id,
        title,
        state: SessionState::Disposed,
        captions,
        chapters: visits,
        position,
        resources_released,
        resources_remaining: store.len(),
    };

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(out) => println!("{}", out),
            Err(e) => return Err(PlayerError::Config(format!("summary encoding failed: {}", e))),
        }
    } else {
        println!(
            "stopped at {:.1}s, released {} caption resources",
            summary.position, summary.resources_released
        );
    }
    Ok(())
}
