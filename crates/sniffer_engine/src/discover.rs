use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::retry::RetryingFetcher;
use crate::types::PageIndex;

/// Matches listing page links in the pager control, capturing the index.
static PAGE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"list_200_(\d+)\.html").expect("page link pattern"));

/// Probes page 1 and reads the highest page index out of its pager control.
///
/// Every failure mode (fetch failure, missing pager, no matching links)
/// yields `fallback` — discovery must never abort a run.
pub async fn discover_total_pages(fetcher: &RetryingFetcher, fallback: PageIndex) -> PageIndex {
    let Some(html) = fetcher.fetch_page(1).await else {
        log::warn!("page count discovery failed, assuming {fallback} pages");
        return fallback;
    };

    match max_page_in_pager(&html) {
        Some(total) => total,
        None => {
            log::debug!("no pager links found, assuming {fallback} pages");
            fallback
        }
    }
}

/// The highest page index linked from the `div.pages` pager, if any.
pub fn max_page_in_pager(html: &str) -> Option<PageIndex> {
    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("div.pages a[href]").ok()?;

    doc.select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| PAGE_LINK.captures(href))
        .filter_map(|caps| caps[1].parse::<PageIndex>().ok())
        .max()
}
