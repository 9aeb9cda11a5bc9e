//! Page count discovery

use scraper::{Html, Selector};

/// Returns the highest page number offered by the pagination control
///
/// A listing without a pagination control, or whose control carries no
/// numeric label, is a single page.
pub fn last_page(document: &Html) -> u32 {
    let Ok(page_link) = Selector::parse("a.btn.mod-page") else {
        return 1;
    };

    document
        .select(&page_link)
        .filter_map(|link| link.text().collect::<String>().trim().parse::<u32>().ok())
        .max()
        .unwrap_or(1)
        .max(1)
}
