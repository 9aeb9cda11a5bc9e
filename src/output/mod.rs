//! Output module for artifacts and run summaries
//!
//! This module handles:
//! - Merging per-page fragments and serializing them as pretty JSON
//! - Naming and atomically writing artifacts
//! - Listing artifacts for the external uploader
//! - Printing the batch summary

pub mod artifact;
pub mod merge;
mod report;

pub use artifact::{
    listing_artifact_path, ranking_artifact_path, upload_manifest, write_json_atomic,
    ManifestEntry,
};
pub use merge::{merge_fragments, normalize, PageFragment};
pub use report::{print_manifest, print_report, render_report};

use thiserror::Error;

/// Errors raised while writing artifacts
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to persist artifact: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Result type alias for output operations
pub type OutputResult<T> = Result<T, OutputError>;
