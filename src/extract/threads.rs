//! Thread listing extraction

use super::{
    absolute_url, parse_number, selector, text_of, text_or_empty, ExtractError, ExtractResult,
    Record, RecordExtractor, Thread,
};
use crate::config::ListingKind;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Number of newest threads the site pins to the top of every page
///
/// They are genuine on page 1 and repeats everywhere else.
pub const PINNED_THREADS: usize = 3;

/// Extracts [`Thread`] records from a threads listing page
pub struct ThreadExtractor {
    base_url: Url,
    item: Selector,
    frag_container: Selector,
    frag_count: Selector,
    title: Selector,
    date_full: Selector,
    date_eta: Selector,
    post_count: Selector,
}

impl ThreadExtractor {
    pub fn new(base_url: Url) -> ExtractResult<Self> {
        Ok(Self {
            base_url,
            item: selector("div.wf-module-item.thread")?,
            frag_container: selector("div.frag-container")?,
            frag_count: selector("span.frag-count")?,
            title: selector(".thread-item-header-title")?,
            date_full: selector("span.date-full")?,
            date_eta: selector("span.date-eta")?,
            post_count: selector("span.post-count")?,
        })
    }

    fn thread(&self, item: ElementRef<'_>) -> ExtractResult<Thread> {
        let id_raw = item
            .select(&self.frag_container)
            .next()
            .ok_or(ExtractError::MissingElement { field: "id" })?
            .value()
            .attr("data-thread-id")
            .ok_or(ExtractError::MissingAttribute {
                field: "id",
                attribute: "data-thread-id",
            })?;
        let id = parse_number("id", id_raw)?;

        let frag_raw = text_of(item, &self.frag_count)
            .ok_or(ExtractError::MissingElement { field: "frag_count" })?;
        let frag_count = parse_number("frag_count", &frag_raw)?;

        // "12 posts" style text; only the leading number matters
        let posts_raw = text_of(item, &self.post_count)
            .ok_or(ExtractError::MissingElement {
                field: "comment_count",
            })?;
        let first_token = posts_raw.split(' ').next().unwrap_or_default();
        let comment_count = parse_number("comment_count", first_token)?;

        let title_element = item
            .select(&self.title)
            .next()
            .ok_or(ExtractError::MissingElement { field: "title" })?;
        let href = title_element
            .value()
            .attr("href")
            .ok_or(ExtractError::MissingAttribute {
                field: "url",
                attribute: "href",
            })?;

        Ok(Thread {
            id,
            title: super::collapse_whitespace(&title_element.text().collect::<String>()),
            url: absolute_url(&self.base_url, "url", href)?,
            frag_count,
            date_published: text_or_empty(item, &self.date_full),
            date_published_ago: text_or_empty(item, &self.date_eta),
            comment_count,
        })
    }
}

impl RecordExtractor for ThreadExtractor {
    fn kind(&self) -> ListingKind {
        ListingKind::Threads
    }

    fn extract(&self, document: &Html, page: u32) -> ExtractResult<Vec<Record>> {
        document
            .select(&self.item)
            .enumerate()
            .filter(|(index, _)| page <= 1 || *index >= PINNED_THREADS)
            .map(|(_, item)| self.thread(item).map(Record::Thread))
            .collect()
    }
}
