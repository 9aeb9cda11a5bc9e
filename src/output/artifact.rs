//! Artifact naming, atomic writes and the upload manifest

use crate::extract::Record;
use crate::output::merge::to_pretty_json;
use crate::output::OutputResult;
use chrono::{DateTime, Local};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Subdirectory holding one artifact per ranking region
pub const RANKING_DIR: &str = "ranking";

/// Formats the suffix that makes every run's artifact name unique
pub fn timestamp_suffix(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// `<dir>/<name>[_<timestamp>].json`
pub fn listing_artifact_path(dir: &Path, name: &str, timestamp: Option<&str>) -> PathBuf {
    let file_name = match timestamp {
        Some(stamp) => format!("{}_{}.json", name, stamp),
        None => format!("{}.json", name),
    };
    dir.join(file_name)
}

/// `<dir>/ranking/output<Region>Rankings.json`
pub fn ranking_artifact_path(dir: &Path, region_slug: &str) -> PathBuf {
    dir.join(RANKING_DIR)
        .join(format!("output{}Rankings.json", region_slug))
}

/// Writes records as one pretty-printed JSON array, replacing `path` atomically
///
/// The bytes go to a temporary file in the target directory which is then
/// renamed over `path`, so readers never observe a half-written artifact.
pub fn write_json_atomic(path: &Path, records: &[Record]) -> OutputResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let bytes = to_pretty_json(records)?;
    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(&bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path)?;

    tracing::debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// One file for the external uploader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Location on disk
    pub path: PathBuf,
    /// Object key: path relative to the output directory, `/`-separated
    pub key: String,
}

/// Lists every regular file under `dir`, keyed by its relative path
///
/// Hidden files (including in-flight temporary files) are skipped. Entries
/// are sorted by key. A missing directory yields an empty manifest.
pub fn upload_manifest(dir: &Path) -> OutputResult<Vec<ManifestEntry>> {
    let mut entries = Vec::new();
    if dir.is_dir() {
        collect_files(dir, dir, &mut entries)?;
    }
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(entries)
}

fn collect_files(root: &Path, dir: &Path, entries: &mut Vec<ManifestEntry>) -> OutputResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(root, &path, entries)?;
        } else if file_type.is_file() {
            let key = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            entries.push(ManifestEntry { path, key });
        }
    }
    Ok(())
}
