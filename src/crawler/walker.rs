//! Listing walker - pagination-driven scrape of one listing
//!
//! A walk fetches the listing's first page to read the pagination control,
//! then visits every page in order under the walk's [`WalkBudget`]:
//! - acquire a permit (deadline or cancellation is a soft stop)
//! - fetch `...&page=k` and extract records with the listing's extractor
//! - complete records that need a detail page
//! - keep the page's records as one fragment
//!
//! Collected fragments are merged in page order and written once, atomically.
//! A transport or extraction failure fails the walk and writes nothing.

use crate::config::{Config, ListingKind, ListingSource};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::limiter::WalkBudget;
use crate::extract::{extractor_for, last_page, parse_document, Record, RecordExtractor};
use crate::output::artifact::{listing_artifact_path, timestamp_suffix, write_json_atomic};
use crate::output::merge::{merge_fragments, PageFragment};
use crate::state::WalkState;
use crate::{CancelReason, ConfigError, Result, ScrapeError};
use chrono::Local;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// How a walk that produced an artifact ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every page up to the last one was walked
    Complete,
    /// The walk was stopped early; the artifact holds the pages completed
    Partial(CancelReason),
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Partial(reason) => write!(f, "partial ({})", reason),
        }
    }
}

/// Summary of a walk that wrote its artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOutcome {
    pub listing: String,
    pub kind: ListingKind,
    /// Highest page number offered by the pagination control
    pub last_page: u32,
    /// Pages whose records made it into the artifact
    pub pages_walked: u32,
    pub records: usize,
    pub artifact: PathBuf,
    pub completion: Completion,
}

impl WalkOutcome {
    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Complete
    }
}

/// Mutable bookkeeping of one walk in progress
struct Progress {
    state: WalkState,
    last_page: u32,
    fragments: Vec<PageFragment>,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: WalkState::Discovering,
            last_page: 1,
            fragments: Vec::new(),
        }
    }

    fn advance(&mut self, next: WalkState) -> Result<()> {
        self.state = self.state.transition(next)?;
        Ok(())
    }
}

/// Walks listings of one site and writes their artifacts
pub struct Walker {
    fetcher: Fetcher,
    base_url: Url,
    output_dir: PathBuf,
    timestamp_suffix: bool,
    rate_limit_details: bool,
}

impl Walker {
    /// Creates a walker from the full configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Walker)` - HTTP client built and base URL parsed
    /// * `Err(ScrapeError)` - Invalid base URL or client construction failure
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::from_config(config)?,
            base_url: directory_url(&config.scraper.base_url)?,
            output_dir: PathBuf::from(&config.output.directory),
            timestamp_suffix: config.output.timestamp_suffix,
            rate_limit_details: config.scraper.rate_limit_detail_fetches,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Builds `<base>/<section><query>`, plus `page=<n>` when a page is given
    pub fn listing_url(&self, listing: &ListingSource, page: Option<u32>) -> Result<Url> {
        let relative = format!("{}{}", listing.section.trim_matches('/'), listing.query);
        let mut url = self.base_url.join(&relative)?;
        if let Some(page) = page {
            url.query_pairs_mut().append_pair("page", &page.to_string());
        }
        Ok(url)
    }

    /// Path of the artifact a walk of `name` writes to
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        let stamp = self
            .timestamp_suffix
            .then(|| timestamp_suffix(Local::now()));
        listing_artifact_path(&self.output_dir, name, stamp.as_deref())
    }

    /// Acquires a permit, then fetches `url` within the walk's budget
    pub(crate) async fn fetch_page(&self, url: &str, budget: &WalkBudget) -> Result<String> {
        budget.acquire().await?;
        budget.guard(self.fetcher.fetch(url)).await?
    }

    /// Walks every page of `listing` and writes its artifact
    ///
    /// # Returns
    ///
    /// * `Ok(WalkOutcome)` - Artifact written, complete or partial
    /// * `Err(ScrapeError)` - Transport, extraction or write failure; no artifact
    pub async fn walk(&self, listing: &ListingSource, budget: &WalkBudget) -> Result<WalkOutcome> {
        let extractor = extractor_for(listing.kind, &self.base_url).map_err(|source| {
            ScrapeError::Extract {
                url: self.base_url.to_string(),
                source,
            }
        })?;

        tracing::info!("Walking listing '{}' ({})", listing.name, listing.kind);

        let mut progress = Progress::new();
        let visited = self
            .visit_pages(listing, extractor.as_ref(), budget, &mut progress)
            .await;
        let completion = match visited {
            Ok(()) => Completion::Complete,
            Err(ScrapeError::Cancelled(reason)) => {
                tracing::warn!(
                    "Listing '{}' stopped at {}: {}; keeping {} completed pages",
                    listing.name,
                    progress.state,
                    reason,
                    progress.fragments.len()
                );
                Completion::Partial(reason)
            }
            Err(e) => {
                progress.advance(WalkState::Failed)?;
                tracing::error!("Listing '{}' failed: {}", listing.name, e);
                return Err(e);
            }
        };

        progress.advance(WalkState::Finalizing)?;
        let pages_walked = progress.fragments.len() as u32;
        let records = merge_fragments(std::mem::take(&mut progress.fragments));
        let artifact = self.artifact_path(&listing.name);

        if let Err(e) = write_json_atomic(&artifact, &records) {
            progress.advance(WalkState::Failed)?;
            tracing::error!("Failed to write {}: {}", artifact.display(), e);
            return Err(e.into());
        }
        progress.advance(WalkState::Done)?;

        tracing::info!(
            "Listing '{}' done: {} records from {}/{} pages -> {}",
            listing.name,
            records.len(),
            pages_walked,
            progress.last_page,
            artifact.display()
        );

        Ok(WalkOutcome {
            listing: listing.name.clone(),
            kind: listing.kind,
            last_page: progress.last_page,
            pages_walked,
            records: records.len(),
            artifact,
            completion,
        })
    }

    /// Discovery followed by the page loop
    ///
    /// Leaves the state at the page being processed when it returns early.
    async fn visit_pages(
        &self,
        listing: &ListingSource,
        extractor: &dyn RecordExtractor,
        budget: &WalkBudget,
        progress: &mut Progress,
    ) -> Result<()> {
        let seed = self.listing_url(listing, None)?;
        let body = self.fetch_page(seed.as_str(), budget).await?;
        progress.last_page = last_page(&parse_document(&body));
        tracing::info!("Listing '{}' has {} pages", listing.name, progress.last_page);

        for page in 1..=progress.last_page {
            progress.advance(WalkState::Walking(page))?;
            let records = self.walk_page(listing, extractor, budget, page).await?;
            let fragment = PageFragment::new(page, records);
            tracing::info!(
                "Listing '{}' page {}/{}: {} records",
                listing.name,
                page,
                progress.last_page,
                fragment.len()
            );
            if fragment.is_empty() {
                tracing::warn!("Listing '{}' page {} yielded no records", listing.name, page);
            }
            tracing::debug!("{:?} left in the walk budget", budget.remaining());
            progress.fragments.push(fragment);
        }
        Ok(())
    }

    /// Fetches, extracts and completes the records of one page
    async fn walk_page(
        &self,
        listing: &ListingSource,
        extractor: &dyn RecordExtractor,
        budget: &WalkBudget,
        page: u32,
    ) -> Result<Vec<Record>> {
        let url = self.listing_url(listing, Some(page))?;
        let body = self.fetch_page(url.as_str(), budget).await?;
        let mut records = extract_records(extractor, &body, page, url.as_str())?;
        self.complete_details(extractor, budget, &mut records).await?;
        Ok(records)
    }

    /// Visits the detail page of every record that needs one
    async fn complete_details(
        &self,
        extractor: &dyn RecordExtractor,
        budget: &WalkBudget,
        records: &mut [Record],
    ) -> Result<()> {
        for record in records.iter_mut() {
            let Some(url) = extractor.detail_url(record) else {
                continue;
            };

            if self.rate_limit_details {
                budget.acquire().await?;
            } else {
                budget.check()?;
            }
            let body = budget.guard(self.fetcher.fetch(&url)).await??;

            let detail = parse_document(&body);
            extractor
                .apply_detail(record, &detail)
                .map_err(|source| ScrapeError::Extract { url, source })?;
        }
        Ok(())
    }
}

/// Parses one page body and runs the extractor over it
fn extract_records(
    extractor: &dyn RecordExtractor,
    body: &str,
    page: u32,
    url: &str,
) -> Result<Vec<Record>> {
    let document = parse_document(body);
    extractor
        .extract(&document, page)
        .map_err(|source| ScrapeError::Extract {
            url: url.to_string(),
            source,
        })
}

/// Parses the base URL so relative sections resolve below its path
fn directory_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(raw.to_string()).into());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
