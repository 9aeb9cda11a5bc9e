//! Ranking fan-out
//!
//! The rankings root page lists one navigation entry per region. Each region
//! page is fetched under the same budget and written to its own artifact.

use crate::crawler::limiter::WalkBudget;
use crate::crawler::walker::{Completion, Walker};
use crate::extract::{parse_document, region_slugs, Record, RankingExtractor, RecordExtractor};
use crate::output::artifact::{ranking_artifact_path, write_json_atomic};
use crate::{Result, ScrapeError};
use std::path::PathBuf;
use url::Url;

/// One region artifact written by the fan-out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionOutcome {
    pub region: String,
    pub records: usize,
    pub artifact: PathBuf,
}

/// Summary of a ranking fan-out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingOutcome {
    /// Regions found in the navigation
    pub discovered: usize,
    /// Regions whose artifact was written, in navigation order
    pub regions: Vec<RegionOutcome>,
    pub completion: Completion,
}

impl RankingOutcome {
    pub fn total_records(&self) -> usize {
        self.regions.iter().map(|region| region.records).sum()
    }
}

impl Walker {
    /// `<base>/<section>[/<slug>]`
    pub fn rankings_url(&self, section: &str, slug: Option<&str>) -> Result<Url> {
        let section = section.trim_matches('/');
        let relative = match slug {
            Some(slug) => format!("{}/{}", section, slug),
            None => section.to_string(),
        };
        Ok(self.base_url().join(&relative)?)
    }

    /// Discovers every region and writes one ranking artifact per region
    ///
    /// Cancellation stops the fan-out; regions already written stay on disk
    /// and the outcome is partial. Any other failure ends the fan-out with
    /// an error, also leaving earlier regions in place.
    pub async fn walk_rankings(&self, section: &str, budget: &WalkBudget) -> Result<RankingOutcome> {
        let root = self.rankings_url(section, None)?;

        let body = match self.fetch_page(root.as_str(), budget).await {
            Ok(body) => body,
            Err(ScrapeError::Cancelled(reason)) => {
                tracing::warn!("Rankings stopped before discovery: {}", reason);
                return Ok(RankingOutcome {
                    discovered: 0,
                    regions: Vec::new(),
                    completion: Completion::Partial(reason),
                });
            }
            Err(e) => return Err(e),
        };
        let slugs = region_slugs(&parse_document(&body));
        tracing::info!("Found {} ranking regions", slugs.len());

        let mut outcome = RankingOutcome {
            discovered: slugs.len(),
            regions: Vec::with_capacity(slugs.len()),
            completion: Completion::Complete,
        };

        for slug in &slugs {
            match self.walk_region(section, slug, budget).await {
                Ok(region) => outcome.regions.push(region),
                Err(ScrapeError::Cancelled(reason)) => {
                    tracing::warn!(
                        "Rankings stopped at region '{}': {}; {} of {} regions written",
                        slug,
                        reason,
                        outcome.regions.len(),
                        outcome.discovered
                    );
                    outcome.completion = Completion::Partial(reason);
                    break;
                }
                Err(e) => {
                    tracing::error!("Ranking region '{}' failed: {}", slug, e);
                    return Err(e);
                }
            }
        }

        Ok(outcome)
    }

    /// Fetches one region page and writes its artifact
    pub async fn walk_region(
        &self,
        section: &str,
        slug: &str,
        budget: &WalkBudget,
    ) -> Result<RegionOutcome> {
        let url = self.rankings_url(section, Some(slug))?;
        let body = self.fetch_page(url.as_str(), budget).await?;

        let records = extract_region(self, slug, &body, url.as_str())?;
        let artifact = ranking_artifact_path(self.output_dir(), slug);
        write_json_atomic(&artifact, &records)?;

        tracing::info!("Region '{}': {} teams -> {}", slug, records.len(), artifact.display());
        Ok(RegionOutcome {
            region: slug.to_string(),
            records: records.len(),
            artifact,
        })
    }
}

fn extract_region(walker: &Walker, slug: &str, body: &str, url: &str) -> Result<Vec<Record>> {
    let to_error = |source| ScrapeError::Extract {
        url: url.to_string(),
        source,
    };
    let extractor = RankingExtractor::new(walker.base_url().clone())
        .map_err(to_error)?
        .with_region(slug);
    extractor.extract(&parse_document(body), 1).map_err(to_error)
}
