//! Regional ranking extraction

use super::{
    absolute_url, parse_number, selector, ExtractError, ExtractResult, Ranking, Record,
    RecordExtractor,
};
use crate::config::ListingKind;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Aggregate entry in the region navigation that has no page of its own
const WORLD: &str = "World";

/// Extracts [`Ranking`] records from one region's ranking page
pub struct RankingExtractor {
    base_url: Url,
    region: String,
    item: Selector,
    team: Selector,
    rating: Selector,
}

impl RankingExtractor {
    pub fn new(base_url: Url) -> ExtractResult<Self> {
        Ok(Self {
            base_url,
            region: String::new(),
            item: selector("div.rank-item")?,
            team: selector("a.rank-item-team")?,
            rating: selector("div.rank-item-rating")?,
        })
    }

    /// Labels every extracted record with this region slug
    pub fn with_region(mut self, slug: &str) -> Self {
        self.region = slug.replace('-', " ");
        self
    }

    fn ranking(&self, rank: u32, item: ElementRef<'_>) -> ExtractResult<Ranking> {
        let team = item
            .select(&self.team)
            .next()
            .ok_or(ExtractError::MissingElement { field: "team_name" })?;
        let team_name = team
            .value()
            .attr("data-sort-value")
            .ok_or(ExtractError::MissingAttribute {
                field: "team_name",
                attribute: "data-sort-value",
            })?
            .trim()
            .to_string();
        let href = team.value().attr("href").ok_or(ExtractError::MissingAttribute {
            field: "team_url",
            attribute: "href",
        })?;

        let elo_raw = item
            .select(&self.rating)
            .next()
            .ok_or(ExtractError::MissingElement { field: "elo" })?
            .value()
            .attr("data-sort-value")
            .ok_or(ExtractError::MissingAttribute {
                field: "elo",
                attribute: "data-sort-value",
            })?;

        Ok(Ranking {
            rank,
            region: self.region.clone(),
            team_name,
            elo: parse_number("elo", elo_raw)?,
            team_url: absolute_url(&self.base_url, "team_url", href)?,
        })
    }
}

impl RecordExtractor for RankingExtractor {
    fn kind(&self) -> ListingKind {
        ListingKind::Rankings
    }

    /// Rank follows document order, starting at 1
    fn extract(&self, document: &Html, _page: u32) -> ExtractResult<Vec<Record>> {
        document
            .select(&self.item)
            .zip(1u32..)
            .map(|(item, rank)| self.ranking(rank, item).map(Record::Ranking))
            .collect()
    }
}

/// Reads the region navigation of the rankings root page
///
/// Every run of characters other than letters and digits becomes one `-`,
/// so a slug is safe both as a URL path segment and inside a file name.
/// The `World` aggregate and empty labels are skipped; duplicates keep their
/// first position.
pub fn region_slugs(document: &Html) -> Vec<String> {
    let (Ok(nav_item), Ok(label)) = (
        Selector::parse("a.wf-nav-item.mod-collapsible"),
        Selector::parse("span.normal"),
    ) else {
        return Vec::new();
    };

    let mut slugs: Vec<String> = Vec::new();
    for item in document.select(&nav_item) {
        let text: String = item
            .select(&label)
            .flat_map(|span| span.text())
            .collect();
        let slug = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        if slug.is_empty() || slug == WORLD || slugs.contains(&slug) {
            continue;
        }
        slugs.push(slug);
    }
    slugs
}
