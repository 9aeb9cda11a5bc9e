//! Match listing extraction
//!
//! The listing page carries everything except the match date, which only
//! appears on each match's own page. [`MatchExtractor::extract`] leaves
//! `date` empty and the walker fills it in through
//! [`RecordExtractor::detail_url`] and [`RecordExtractor::apply_detail`].

use super::{
    absolute_url, collapse_whitespace, is_int, parse_number, selector, text_or_empty,
    ExtractError, ExtractResult, Match, Record, RecordExtractor,
};
use crate::config::ListingKind;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Placeholder the site shows instead of a score before a match starts
const NO_SCORE: &str = "–";

/// Extracts [`Match`] records from a matches listing page
pub struct MatchExtractor {
    base_url: Url,
    item: Selector,
    vs_team: Selector,
    event_series: Selector,
    match_time: Selector,
    eta: Selector,
    detail_date: Selector,
}

impl MatchExtractor {
    pub fn new(base_url: Url) -> ExtractResult<Self> {
        Ok(Self {
            base_url,
            item: selector("a.match-item")?,
            vs_team: selector("div.match-item-vs-team")?,
            event_series: selector("div.match-item-event-series")?,
            match_time: selector("div.match-item-time")?,
            eta: selector("div.ml-eta")?,
            detail_date: selector("div.moment-tz-convert")?,
        })
    }

    fn match_record(&self, item: ElementRef<'_>) -> ExtractResult<Match> {
        let href = item.value().attr("href").ok_or(ExtractError::MissingAttribute {
            field: "id",
            attribute: "href",
        })?;

        // "/12345/team-a-vs-team-b-..." carries the id as its first segment
        let id_raw = href
            .split('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or_default();
        let id = parse_number("id", id_raw)?;

        let segments: Vec<String> = item
            .select(&self.vs_team)
            .flat_map(|team| team.text())
            .map(str::trim)
            .filter(|text| !text.is_empty() && *text != NO_SCORE)
            .map(str::to_string)
            .collect();
        let (team1, team2) = split_teams(&segments)?;

        let time_until_match = match text_or_empty(item, &self.eta) {
            eta if eta.is_empty() => "Live".to_string(),
            eta => eta,
        };

        Ok(Match {
            id,
            url: absolute_url(&self.base_url, "url", href)?,
            tournament: collapse_whitespace(
                &text_or_empty(item, &self.event_series).replace(NO_SCORE, " "),
            ),
            team1,
            team2,
            date: String::new(),
            match_time: text_or_empty(item, &self.match_time),
            time_until_match,
        })
    }
}

/// Picks both team names out of the vs-block text segments
///
/// Segments run `team1 [score1] team2 [score2]`. When the naive second
/// segment parses as an integer it is team1's score, so team2 sits one
/// segment further on.
pub(crate) fn split_teams(segments: &[String]) -> ExtractResult<(String, String)> {
    let missing = || ExtractError::MissingTeam {
        raw: segments.join(" | "),
    };

    let team1 = segments.first().filter(|s| !is_int(s)).ok_or_else(missing)?;
    let naive = segments.get(1).ok_or_else(missing)?;

    let team2 = if is_int(naive) {
        segments.get(2).ok_or_else(missing)?
    } else {
        naive
    };

    if is_int(team2) {
        return Err(missing());
    }

    Ok((team1.clone(), team2.clone()))
}

impl RecordExtractor for MatchExtractor {
    fn kind(&self) -> ListingKind {
        ListingKind::Matches
    }

    fn extract(&self, document: &Html, _page: u32) -> ExtractResult<Vec<Record>> {
        document
            .select(&self.item)
            .map(|item| self.match_record(item).map(Record::Match))
            .collect()
    }

    fn detail_url(&self, record: &Record) -> Option<String> {
        match record {
            Record::Match(m) => Some(m.url.clone()),
            _ => None,
        }
    }

    fn apply_detail(&self, record: &mut Record, detail: &Html) -> ExtractResult<()> {
        if let Record::Match(m) = record {
            let parts: Vec<String> = detail
                .select(&self.detail_date)
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                .filter(|text| !text.is_empty())
                .collect();
            m.date = parts.join(" ");
        }
        Ok(())
    }
}
