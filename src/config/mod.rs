//! Configuration module for vlr-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use vlr_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Walking {} listings", config.listings.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ListingKind, ListingSource, OutputConfig, RankingsConfig, ScraperConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
