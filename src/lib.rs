//! vlr-harvest: a paginated listing scraper
//!
//! This crate walks the paginated listings of a sports-statistics site
//! (forum threads, matches, team rankings) under a rate limit, extracts
//! typed records from the HTML and writes each listing to one JSON artifact.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for scrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Extraction failed for {url}: {source}")]
    Extract {
        url: String,
        source: extract::ExtractError,
    },

    #[error("Walk cancelled: {0}")]
    Cancelled(CancelReason),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::WalkState,
        to: state::WalkState,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Why a walk stopped before visiting every page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The walk's wall-clock budget ran out
    Deadline,
    /// Cancellation was requested (e.g. Ctrl-C)
    Signal,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deadline => write!(f, "walk deadline exceeded"),
            Self::Signal => write!(f, "cancellation requested"),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, ListingKind, ListingSource};
pub use crawler::{run_batch, BatchReport, WalkOutcome};
pub use extract::Record;
pub use state::WalkState;
