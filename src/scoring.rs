//! Classification and ranking of candidate image URLs.
//!
//! All checks are substring tests on the lowercased URL. A candidate is used
//! only if it is not logo-like, does not have a disallowed extension, and
//! scores at least [`MIN_ACCEPT_SCORE`].
//!
//! | Signal | Points |
//! |--------|--------|
//! | content hint (`hero`, `news`, `photo`, ...) | +10 |
//! | raster extension (jpg, jpeg, png, webp, avif) | +5 |
//! | size hint (`w=1200`, `1600`, ...) | +2 |
//! | logo-like (`logo`, `icon`, `badge`, ...) | −20 |
//! | disallowed extension (svg, gif) | −10 |

use once_cell::sync::Lazy;
use regex::Regex;

/// Lowest score a candidate may have and still be used.
pub const MIN_ACCEPT_SCORE: i32 = 1;

const LOGO_HINTS: &[&str] = &[
    "logo", "favicon", "icon", "sprite", "wordmark", "lockup", "brandmark", "badge", "avatar",
    "mark",
];

const CONTENT_HINTS: &[&str] = &[
    "hero",
    "featured",
    "feature",
    "article",
    "banner",
    "news",
    "press",
    "upload",
    "uploads",
    "media",
    "images",
    "photo",
    "screenshot",
    "figure",
    "cover",
];

const SIZE_HINTS: &[&str] = &[
    "w=1200", "width=1200", "1200x", "_1200", "-1200", "w_1200", "1024", "1600", "2048",
];

static DISALLOWED_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(svg|gif)(?:[?#].*)?$").expect("static regex"));

static ACCEPTED_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(jpe?g|png|webp|avif)(?:[?#].*)?$").expect("static regex"));

/// Vector graphics and GIFs are never used, whatever else the URL says.
pub fn is_disallowed_ext(url: &str) -> bool {
    DISALLOWED_EXT.is_match(&url.to_lowercase())
}

/// True for URLs that look like site chrome rather than article imagery.
pub fn is_logo_like(url: &str) -> bool {
    let lower = url.to_lowercase();
    LOGO_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Whether `url` passes both pre-filters.
pub fn is_usable(url: &str) -> bool {
    !is_disallowed_ext(url) && !is_logo_like(url)
}

/// Heuristic score, higher is better.
pub fn score(url: &str) -> i32 {
    let lower = url.to_lowercase();
    let mut s = 0;

    if CONTENT_HINTS.iter().any(|hint| lower.contains(hint)) {
        s += 10;
    }
    if ACCEPTED_EXT.is_match(&lower) {
        s += 5;
    }
    if SIZE_HINTS.iter().any(|hint| lower.contains(hint)) {
        s += 2;
    }
    if is_logo_like(&lower) {
        s -= 20;
    }
    if is_disallowed_ext(&lower) {
        s -= 10;
    }
    s
}

/// Whether a score clears the acceptance threshold.
pub fn is_acceptable(score: i32) -> bool {
    score >= MIN_ACCEPT_SCORE
}
