use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::FontRecord;

/// Path prefix of detail links within the catalog.
const DETAIL_PATH_PREFIX: &str = "/font/";

/// Extracts the filtered records of one listing page.
///
/// Pure function over the raw HTML: the fixed results container and item
/// list are looked up, and each item's detail anchor becomes a record when
/// its name contains `keyword_lowercased` (an empty keyword passes
/// everything). Relative hrefs are resolved against `page_url`. Any missing
/// structure degrades to an empty result; malformed markup never errors.
pub fn parse_records(html: &str, keyword_lowercased: &str, page_url: &str) -> Vec<FontRecord> {
    let doc = Html::parse_document(html);
    let section_sel = Selector::parse("section.mg-t10.border.soft-list").ok();
    let list_sel = Selector::parse("ul#li-change-color.soft-list-bd.hover-one").ok();
    let item_sel = Selector::parse("li").ok();
    let anchor_sel = Selector::parse("a.mg-r10").ok();

    let (Some(section_sel), Some(list_sel), Some(item_sel), Some(anchor_sel)) =
        (section_sel, list_sel, item_sel, anchor_sel)
    else {
        return Vec::new();
    };

    let Some(section) = doc.select(&section_sel).next() else {
        return Vec::new();
    };
    let Some(list) = section.select(&list_sel).next() else {
        return Vec::new();
    };

    let base = Url::parse(page_url).ok();

    let mut records = Vec::new();
    for item in list.select(&item_sel) {
        let Some(anchor) = detail_anchor(&item, &anchor_sel) else {
            continue;
        };

        let name = anchor.text().map(str::trim).collect::<String>();
        if !keyword_lowercased.is_empty() && !name.to_lowercase().contains(keyword_lowercased) {
            continue;
        }

        let Some(detail_url) = resolve_detail_url(&anchor, base.as_ref()) else {
            continue;
        };

        records.push(FontRecord { name, detail_url });
    }

    records
}

fn detail_anchor<'a>(item: &ElementRef<'a>, anchor_sel: &Selector) -> Option<ElementRef<'a>> {
    item.select(anchor_sel).find(|a| {
        a.value()
            .attr("href")
            .is_some_and(|href| href.starts_with(DETAIL_PATH_PREFIX))
    })
}

fn resolve_detail_url(anchor: &ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    let href = anchor.value().attr("href")?;
    base?.join(href).ok().map(String::from)
}
