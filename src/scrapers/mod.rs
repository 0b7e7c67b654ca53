//! Article image scraping.
//!
//! The scraper fetches a linked article through a reader proxy and pulls
//! candidate image URLs out of the returned HTML. Extraction sits behind the
//! [`ImageExtractor`] trait so the default regex matcher can be swapped for a
//! DOM-based one without touching the resolver or the scorer.
//!
//! # Extractors
//!
//! | Extractor | Module | Method | Notes |
//! |-----------|--------|--------|-------|
//! | Pattern | [`pattern`] | Regex over raw text | Default; tolerant of broken markup |
//! | Html | [`html`] | `scraper` DOM | Same whitelist, proper attribute parsing |
//!
//! # What is extracted
//!
//! - `content` of `<meta>` tags whose `property` or `name` is in
//!   [`META_IMAGE_KEYS`]
//! - `src` of `<img>` tags
//!
//! Meta candidates come first, then images, each in document order.

pub mod article;
pub mod html;
pub mod pattern;

use serde::Deserialize;
use url::Url;

pub use article::ArticleScraper;
pub use html::HtmlExtractor;
pub use pattern::PatternExtractor;

/// Social preview keys whose `content` names a representative image.
pub const META_IMAGE_KEYS: &[&str] = &[
    "og:image",
    "og:image:url",
    "og:image:secure_url",
    "twitter:image",
    "twitter:image:src",
];

/// Pulls raw (possibly relative) image URLs out of an HTML document.
pub trait ImageExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Vec<String>;
}

/// Which [`ImageExtractor`] to build from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    #[default]
    Pattern,
    Html,
}

impl ExtractorKind {
    pub fn build(self) -> Box<dyn ImageExtractor> {
        match self {
            Self::Pattern => Box::new(PatternExtractor),
            Self::Html => Box::new(HtmlExtractor),
        }
    }
}

/// Whether a meta `property`/`name` value is one of [`META_IMAGE_KEYS`].
pub fn is_meta_image_key(key: &str) -> bool {
    let key = key.trim();
    META_IMAGE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Resolve `raw` against the article URL.
///
/// Protocol-relative (`//cdn/x.jpg`) takes the article's scheme, root- and
/// path-relative forms are joined, absolute `http(s)` URLs pass through.
/// Empty values and `data:` URIs are dropped.
pub fn absolutize(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(raw.to_string());
    }
    if raw.starts_with("//") {
        return Some(format!("{}:{}", base.scheme(), raw));
    }
    base.join(raw).ok().map(|u| u.to_string())
}

/// Decode the few entities that show up inside attribute values.
pub(crate) fn decode_entities(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&#38;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
