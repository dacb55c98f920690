use thiserror::Error;

use crate::session::SessionState;

/// Main error type for the player
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The playback engine could not be instantiated
    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    /// A handle was registered after the ledger was released
    #[error("Resource ledger already released")]
    LedgerClosed,
}

/// Caption fetch failures. Never fatal to a session.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status} fetching {location}")]
    Http { location: String, status: u16 },

    #[error("Transport error fetching {location}: {reason}")]
    Transport { location: String, reason: String },

    #[error("Failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported caption location: {0}")]
    UnsupportedScheme(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, PlayerError>;
