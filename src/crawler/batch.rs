//! Batch runner: every configured listing, then the ranking fan-out

use crate::config::Config;
use crate::crawler::limiter::WalkBudget;
use crate::crawler::rankings::RankingOutcome;
use crate::crawler::walker::{WalkOutcome, Walker};
use crate::Result;
use tokio_util::sync::CancellationToken;

/// Name that selects the ranking fan-out in an `only` filter
pub const RANKINGS_SELECTOR: &str = "rankings";

/// Results of one batch run, in execution order
#[derive(Debug)]
pub struct BatchReport {
    pub listings: Vec<(String, Result<WalkOutcome>)>,
    /// `None` when rankings are disabled, filtered out or never reached
    pub rankings: Option<Result<RankingOutcome>>,
    /// Set when the batch token was cancelled before every job ran
    pub interrupted: bool,
}

impl BatchReport {
    /// True when no listing or ranking walk failed
    ///
    /// Partial walks count as successes; their artifacts are valid.
    pub fn is_success(&self) -> bool {
        self.listings.iter().all(|(_, result)| result.is_ok())
            && self.rankings.as_ref().map_or(true, |result| result.is_ok())
    }

    pub fn failures(&self) -> usize {
        let listings = self.listings.iter().filter(|(_, r)| r.is_err()).count();
        let rankings = usize::from(matches!(self.rankings, Some(Err(_))));
        listings + rankings
    }

    pub fn total_records(&self) -> usize {
        let listings: usize = self
            .listings
            .iter()
            .filter_map(|(_, result)| result.as_ref().ok())
            .map(|outcome| outcome.records)
            .sum();
        let rankings = match &self.rankings {
            Some(Ok(outcome)) => outcome.total_records(),
            _ => 0,
        };
        listings + rankings
    }
}

fn is_selected(only: &[String], name: &str) -> bool {
    only.is_empty() || only.iter().any(|selected| selected == name)
}

/// Runs every selected listing, then the ranking fan-out
///
/// Each walk gets its own budget, bound to a child of `cancel`. A failing
/// listing is recorded and the next one runs. Once `cancel` fires, the
/// walk in progress flushes what it has and no further walk starts.
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `only` - Listing names to run (`rankings` selects the fan-out); empty runs all
/// * `cancel` - Batch-wide cancellation token
///
/// # Returns
///
/// * `Ok(BatchReport)` - Per-job results
/// * `Err(ScrapeError)` - The shared HTTP client could not be built
pub async fn run_batch(
    config: &Config,
    only: &[String],
    cancel: CancellationToken,
) -> Result<BatchReport> {
    let walker = Walker::new(config)?;
    let mut report = BatchReport {
        listings: Vec::new(),
        rankings: None,
        interrupted: false,
    };

    for listing in config.listings.iter().filter(|l| is_selected(only, &l.name)) {
        if cancel.is_cancelled() {
            tracing::warn!("Batch cancelled; skipping remaining listings");
            report.interrupted = true;
            return Ok(report);
        }

        let budget = WalkBudget::from_config(&config.scraper, cancel.child_token());
        let result = walker.walk(listing, &budget).await;
        report.listings.push((listing.name.clone(), result));
    }

    if config.rankings.enabled && is_selected(only, RANKINGS_SELECTOR) {
        if cancel.is_cancelled() {
            tracing::warn!("Batch cancelled; skipping rankings");
            report.interrupted = true;
            return Ok(report);
        }

        let budget = WalkBudget::from_config(&config.scraper, cancel.child_token());
        let result = walker
            .walk_rankings(&config.rankings.section, &budget)
            .await;
        if let Err(e) = &result {
            tracing::error!("Rankings failed: {}", e);
        }
        report.rankings = Some(result);
    }

    report.interrupted = cancel.is_cancelled();
    tracing::info!(
        "Batch finished: {} records, {} failures",
        report.total_records(),
        report.failures()
    );
    Ok(report)
}
