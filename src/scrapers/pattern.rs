//! Regex extraction over the raw proxy response.
//!
//! No DOM is built. Tags are located with a loose `<meta ...>` / `<img ...>`
//! pattern and their attributes read with a second pattern that accepts
//! double-quoted, single-quoted and bare values in any order.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ImageExtractor, decode_entities, is_meta_image_key};

static META_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("static regex"));

static IMG_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("static regex"));

static ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)[\s/]([a-z][a-z0-9_:\-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("static regex")
});

/// Default extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternExtractor;

/// Attribute name/value pairs of one tag, names lowercased.
fn attributes(tag: &str) -> Vec<(String, String)> {
    ATTR.captures_iter(tag)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4))?;
            Some((name, decode_entities(value.as_str())))
        })
        .collect()
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

impl ImageExtractor for PatternExtractor {
    fn extract(&self, html: &str) -> Vec<String> {
        let mut out = Vec::new();

        for tag in META_TAG.find_iter(html) {
            let attrs = attributes(tag.as_str());
            let key = attr(&attrs, "property").or_else(|| attr(&attrs, "name"));
            if key.is_some_and(is_meta_image_key) {
                if let Some(content) = attr(&attrs, "content") {
                    out.push(content.to_string());
                }
            }
        }

        for tag in IMG_TAG.find_iter(html) {
            let attrs = attributes(tag.as_str());
            if let Some(src) = attr(&attrs, "src") {
                out.push(src.to_string());
            }
        }

        out
    }
}
