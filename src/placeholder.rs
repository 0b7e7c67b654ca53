//! Placeholder images and the render-time fallback chain.
//!
//! When no real image is known, an item gets a randomized placeholder. If an
//! image fails to load when shown, display moves down a fixed chain:
//!
//! 1. the resolved image itself
//! 2. `picsum.photos`, seeded
//! 3. `loremflickr.com`, locked to the same seed
//! 4. a generated neutral SVG (`data:` URI, always loads)
//!
//! Once every entry has failed the image is hidden instead of being shown
//! broken.

use rand::{Rng, rng};

use crate::fetcher::HttpFetch;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 630;

/// Ordered placeholder sources derived from one seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderChain {
    seed: u32,
}

impl PlaceholderChain {
    pub fn with_seed(seed: u32) -> Self {
        Self { seed }
    }

    /// A chain with a fresh random seed.
    pub fn random() -> Self {
        Self::with_seed(rng().random())
    }

    /// First placeholder to show.
    pub fn primary(&self) -> String {
        self.sources().remove(0)
    }

    pub fn sources(&self) -> Vec<String> {
        vec![
            format!(
                "https://picsum.photos/seed/{}/{WIDTH}/{HEIGHT}",
                urlencoding::encode(&format!("digest-{}", self.seed))
            ),
            format!(
                "https://loremflickr.com/{WIDTH}/{HEIGHT}/news?lock={}",
                self.seed % 10_000
            ),
            neutral_graphic(),
        ]
    }
}

/// A flat grey 1200x630 SVG as a `data:` URI.
pub fn neutral_graphic() -> String {
    let svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{WIDTH}' height='{HEIGHT}' viewBox='0 0 {WIDTH} {HEIGHT}'>\
         <rect width='100%' height='100%' fill='#e5e7eb'/>\
         <rect x='540' y='255' width='120' height='120' rx='12' fill='#cbd5e1'/></svg>"
    );
    format!("data:image/svg+xml;charset=utf-8,{}", urlencoding::encode(&svg))
}

/// Where an [`ImageFallback`] currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackState {
    Showing(String),
    Hidden,
}

/// Display state of one image element.
#[derive(Debug, Clone)]
pub struct ImageFallback {
    sources: Vec<String>,
    index: usize,
}

impl ImageFallback {
    /// Start at `src`, falling back through `chain`. A placeholder `src` that
    /// already appears in the chain is not tried twice.
    pub fn new(src: &str, chain: &PlaceholderChain) -> Self {
        let mut sources = vec![src.to_string()];
        sources.extend(chain.sources().into_iter().filter(|s| s != src));
        Self { sources, index: 0 }
    }

    pub fn state(&self) -> FallbackState {
        match self.sources.get(self.index) {
            Some(src) => FallbackState::Showing(src.clone()),
            None => FallbackState::Hidden,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.sources.get(self.index).map(String::as_str)
    }

    pub fn is_hidden(&self) -> bool {
        self.index >= self.sources.len()
    }

    /// The current source failed to load; advance.
    pub fn fail(&mut self) -> FallbackState {
        if self.index < self.sources.len() {
            self.index += 1;
        }
        self.state()
    }

    /// Probe sources in order until one loads or the chain runs out.
    pub async fn settle<F: HttpFetch>(&mut self, http: &F) -> FallbackState {
        while let Some(src) = self.current() {
            if http.probe(src).await {
                break;
            }
            self.fail();
        }
        self.state()
    }
}
