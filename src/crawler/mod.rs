//! Crawler module for listing walks
//!
//! This module contains the scrape pipeline, including:
//! - HTTP fetching with status validation
//! - Token-bucket rate limiting bounded by a walk deadline
//! - Pagination-driven listing walks and the ranking fan-out
//! - The batch runner over every configured listing

mod batch;
mod fetcher;
mod limiter;
mod rankings;
mod walker;

pub use batch::{run_batch, BatchReport, RANKINGS_SELECTOR};
pub use fetcher::{build_http_client, Fetcher};
pub use limiter::WalkBudget;
pub use rankings::{RankingOutcome, RegionOutcome};
pub use walker::{Completion, WalkOutcome, Walker};
