//! DOM-based extraction using the `scraper` crate.
//!
//! Produces the same candidates, in the same order, as
//! [`PatternExtractor`](super::PatternExtractor), but lets html5ever deal with
//! attribute quoting, entity decoding and case folding.

use scraper::{Html, Selector};
use tracing::warn;

use super::{ImageExtractor, is_meta_image_key};

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl ImageExtractor for HtmlExtractor {
    fn extract(&self, html: &str) -> Vec<String> {
        let (Ok(meta_selector), Ok(img_selector)) =
            (Selector::parse("meta"), Selector::parse("img[src]"))
        else {
            warn!("Could not build image selectors");
            return Vec::new();
        };

        let document = Html::parse_document(html);
        let mut out = Vec::new();

        for element in document.select(&meta_selector) {
            let el = element.value();
            let key = el.attr("property").or_else(|| el.attr("name"));
            if key.is_some_and(is_meta_image_key) {
                if let Some(content) = el.attr("content") {
                    out.push(content.to_string());
                }
            }
        }

        for element in document.select(&img_selector) {
            if let Some(src) = element.value().attr("src") {
                out.push(src.to_string());
            }
        }

        out
    }
}
