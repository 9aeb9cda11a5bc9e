//! Record extraction from parsed listing pages
//!
//! Every listing kind has one extractor that maps a parsed page to typed
//! records. The CSS selectors for the target site live only in this module
//! tree, so a markup change on the site only touches the extractor for the
//! affected page shape.

mod matches;
mod pagination;
mod rankings;
mod threads;

pub use matches::MatchExtractor;
pub use pagination::last_page;
pub use rankings::{region_slugs, RankingExtractor};
pub use threads::{ThreadExtractor, PINNED_THREADS};

use crate::config::ListingKind;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Errors raised while turning a parsed page into records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("Missing element for field '{field}'")]
    MissingElement { field: &'static str },

    #[error("Missing attribute '{attribute}' for field '{field}'")]
    MissingAttribute {
        field: &'static str,
        attribute: &'static str,
    },

    #[error("Field '{field}' is not an integer: '{value}'")]
    NotAnInteger { field: &'static str, value: String },

    #[error("Could not resolve a team name from '{raw}'")]
    MissingTeam { raw: String },

    #[error("Field '{field}' has an unusable URL: '{value}'")]
    BadUrl { field: &'static str, value: String },
}

/// Result type alias for extraction
pub type ExtractResult<T> = Result<T, ExtractError>;

/// A forum thread from the threads listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: u64,
    pub title: String,
    pub url: String,
    /// Net votes; downvoted threads go negative
    pub frag_count: i32,
    pub date_published: String,
    pub date_published_ago: String,
    pub comment_count: u32,
}

/// An upcoming, live or finished match from the matches listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: u64,
    pub url: String,
    pub tournament: String,
    pub team1: String,
    pub team2: String,
    pub date: String,
    pub match_time: String,
    pub time_until_match: String,
}

/// One team's position in a regional ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    pub rank: u32,
    pub region: String,
    pub team_name: String,
    pub elo: u32,
    pub team_url: String,
}

/// A normalized unit of scraped data
///
/// Serialized untagged, so an artifact is a plain array of record objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Thread(Thread),
    Match(Match),
    Ranking(Ranking),
}

impl Record {
    pub fn kind(&self) -> ListingKind {
        match self {
            Self::Thread(_) => ListingKind::Threads,
            Self::Match(_) => ListingKind::Matches,
            Self::Ranking(_) => ListingKind::Rankings,
        }
    }
}

/// Maps one parsed page of a listing to records
pub trait RecordExtractor {
    /// The listing kind this extractor understands
    fn kind(&self) -> ListingKind;

    /// Extracts every record on the page with the given 1-based ordinal
    ///
    /// Deterministic: the same document always yields the same records.
    fn extract(&self, document: &Html, page: u32) -> ExtractResult<Vec<Record>>;

    /// URL of a detail page that must be visited to complete `record`
    fn detail_url(&self, _record: &Record) -> Option<String> {
        None
    }

    /// Completes `record` from its parsed detail page
    fn apply_detail(&self, _record: &mut Record, _detail: &Html) -> ExtractResult<()> {
        Ok(())
    }
}

/// Builds the extractor for a listing kind
///
/// Ranking extractors built here carry no region; the ranking fan-out
/// builds one per region with [`RankingExtractor::with_region`].
pub fn extractor_for(kind: ListingKind, base_url: &Url) -> ExtractResult<Box<dyn RecordExtractor>> {
    Ok(match kind {
        ListingKind::Threads => Box::new(ThreadExtractor::new(base_url.clone())?),
        ListingKind::Matches => Box::new(MatchExtractor::new(base_url.clone())?),
        ListingKind::Rankings => Box::new(RankingExtractor::new(base_url.clone())?),
    })
}

/// Parses an HTML body into a traversable document
pub fn parse_document(body: &str) -> Html {
    Html::parse_document(body)
}

/// Returns true if the text parses as an integer
pub fn is_int(text: &str) -> bool {
    text.trim().parse::<i64>().is_ok()
}

/// Replaces every run of whitespace with a single space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn selector(css: &str) -> ExtractResult<Selector> {
    Selector::parse(css).map_err(|_| ExtractError::InvalidSelector(css.to_string()))
}

/// Text of the first match below `element`, whitespace-collapsed
pub(crate) fn text_of(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|found| collapse_whitespace(&found.text().collect::<String>()))
}

/// Like [`text_of`] but an absent element yields an empty string
pub(crate) fn text_or_empty(element: ElementRef<'_>, selector: &Selector) -> String {
    text_of(element, selector).unwrap_or_default()
}

pub(crate) fn parse_number<T: FromStr>(field: &'static str, raw: &str) -> ExtractResult<T> {
    let trimmed = raw.trim();
    trimmed.parse::<T>().map_err(|_| ExtractError::NotAnInteger {
        field,
        value: trimmed.to_string(),
    })
}

pub(crate) fn absolute_url(base: &Url, field: &'static str, href: &str) -> ExtractResult<String> {
    base.join(href.trim())
        .map(|url| url.to_string())
        .map_err(|_| ExtractError::BadUrl {
            field,
            value: href.to_string(),
        })
}
