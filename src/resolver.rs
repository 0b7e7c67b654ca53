//! Per-item image resolution.
//!
//! Each item ends in exactly one of four states:
//!
//! | State | When |
//! |-------|------|
//! | [`Explicit`](ResolutionSource::Explicit) | `item.image.src` is set and passes the filter |
//! | [`CacheHit`](ResolutionSource::CacheHit) | the first link is already in the image cache |
//! | [`Scraped`](ResolutionSource::Scraped) | the article scraper found an acceptable image |
//! | [`Placeholder`](ResolutionSource::Placeholder) | no link, or the scrape failed / found nothing |
//!
//! Failed scrapes are not remembered, so an item without an image re-scrapes
//! on every fresh run. There is no timeout beyond the transport's and no
//! retry.
//!
//! [`ImageSlot`] holds the resolution for one displayed item. It starts with
//! a provisional placeholder and takes the real result only if it is still
//! alive and its inputs have not changed in the meantime.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::fetcher::HttpFetch;
use crate::image_cache::ImageCache;
use crate::models::{Item, ResolvedImage};
use crate::placeholder::PlaceholderChain;
use crate::scoring::is_usable;
use crate::scrapers::ArticleScraper;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Explicit,
    CacheHit,
    Scraped,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub source: ResolutionSource,
    pub image: ResolvedImage,
    /// Fallback chain to use if `image.src` fails to load.
    pub chain: PlaceholderChain,
}

impl Resolution {
    fn placeholder(item: &Item, chain: PlaceholderChain) -> Self {
        Self {
            source: ResolutionSource::Placeholder,
            image: ResolvedImage {
                src: chain.primary(),
                caption: None,
                credit: None,
                href: item.first_link().map(|l| l.url.clone()),
            },
            chain,
        }
    }
}

/// The inputs a resolution depends on. A new resolution is needed only when
/// this changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ResolveKey {
    pub link: Option<String>,
    pub explicit: Option<String>,
}

impl ResolveKey {
    pub fn of(item: &Item) -> Self {
        Self {
            link: item.first_link().map(|l| l.url.clone()),
            explicit: item.explicit_src().map(str::to_string),
        }
    }
}

pub struct ImageResolver<F> {
    scraper: ArticleScraper<F>,
    cache: ImageCache,
}

impl<F: HttpFetch> ImageResolver<F> {
    pub fn new(scraper: ArticleScraper<F>, cache: ImageCache) -> Self {
        Self { scraper, cache }
    }

    pub fn scraper(&self) -> &ArticleScraper<F> {
        &self.scraper
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Resolve the display image for `item`.
    #[instrument(level = "debug", skip_all, fields(title = %item.title))]
    pub async fn resolve(&self, item: &Item) -> Resolution {
        let chain = PlaceholderChain::random();

        if let Some(src) = item.explicit_src() {
            if is_usable(src) {
                let image = item.image.as_ref();
                return Resolution {
                    source: ResolutionSource::Explicit,
                    image: ResolvedImage {
                        src: src.to_string(),
                        caption: image.and_then(|i| i.caption.clone().or_else(|| i.alt.clone())),
                        credit: image.and_then(|i| i.credit.clone()),
                        href: image.and_then(|i| i.href.clone()),
                    },
                    chain,
                };
            }
            debug!(%src, "Explicit image rejected by filter");
        }

        let Some(link) = item.first_link() else {
            return Resolution::placeholder(item, chain);
        };

        let scraped_image = |src: String, source| Resolution {
            source,
            image: ResolvedImage {
                src,
                caption: None,
                credit: link.label.clone(),
                href: Some(link.url.clone()),
            },
            chain,
        };

        if let Some(cached) = self.cache.get(&link.url) {
            debug!(url = %link.url, "Image cache hit");
            return scraped_image(cached, ResolutionSource::CacheHit);
        }

        match self.scraper.scrape_image(&link.url).await {
            Some(found) => {
                self.cache.insert(&link.url, &found);
                scraped_image(found, ResolutionSource::Scraped)
            }
            None => Resolution::placeholder(item, chain),
        }
    }
}

/// Shared "still interested" flag for in-flight work.
#[derive(Debug, Clone)]
pub struct LivenessToken(Arc<AtomicBool>);

impl Default for LivenessToken {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl LivenessToken {
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The active resolution for one displayed item.
pub struct ImageSlot {
    key: Mutex<ResolveKey>,
    generation: AtomicU64,
    current: Mutex<Option<Resolution>>,
    /// Generation whose final resolution is in `current`.
    settled: Mutex<Option<u64>>,
    alive: LivenessToken,
}

impl ImageSlot {
    pub fn new(item: &Item) -> Self {
        Self {
            key: Mutex::new(ResolveKey::of(item)),
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
            settled: Mutex::new(None),
            alive: LivenessToken::default(),
        }
    }

    pub fn key(&self) -> ResolveKey {
        self.key.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn current(&self) -> Option<Resolution> {
        self.current.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn liveness(&self) -> LivenessToken {
        self.alive.clone()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.is_alive()
    }

    /// Stop accepting results. In-flight fetches run to completion but are
    /// discarded.
    pub fn dispose(&self) {
        self.alive.revoke();
    }

    /// Point the slot at `item`. Returns `true` if the inputs changed, which
    /// invalidates any resolution still in flight.
    pub fn set_item(&self, item: &Item) -> bool {
        let next = ResolveKey::of(item);
        let mut key = self.key.lock().unwrap_or_else(|p| p.into_inner());
        if *key == next {
            return false;
        }
        *key = next;
        self.generation.fetch_add(1, Ordering::AcqRel);
        true
    }

    fn store(&self, resolution: Resolution) {
        *self.current.lock().unwrap_or_else(|p| p.into_inner()) = Some(resolution);
    }

    fn settled(&self) -> Option<u64> {
        *self.settled.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Whether the shown resolution is final for the slot's current inputs.
    pub fn is_settled(&self) -> bool {
        self.settled() == Some(self.generation.load(Ordering::Acquire))
    }

    /// Resolve `item` into this slot.
    ///
    /// Resolves once per identity: if `item` has the same first link and
    /// explicit image as the settled resolution, that resolution is returned
    /// without touching the network.
    ///
    /// Otherwise installs a provisional placeholder if nothing is shown yet,
    /// then applies the resolver's answer unless the slot was disposed or
    /// re-keyed while it was running. Returns the applied resolution.
    pub async fn run<F: HttpFetch>(
        &self,
        resolver: &ImageResolver<F>,
        item: &Item,
    ) -> Option<Resolution> {
        self.set_item(item);
        let generation = self.generation.load(Ordering::Acquire);

        if self.settled() == Some(generation) {
            if let Some(current) = self.current() {
                return Some(current);
            }
        }

        if self.is_alive() && self.current().is_none() {
            self.store(Resolution::placeholder(item, PlaceholderChain::random()));
        }

        let resolution = resolver.resolve(item).await;

        if !self.is_alive() || self.generation.load(Ordering::Acquire) != generation {
            debug!(title = %item.title, "Dropping stale image resolution");
            return None;
        }
        self.store(resolution.clone());
        *self.settled.lock().unwrap_or_else(|p| p.into_inner()) = Some(generation);
        Some(resolution)
    }
}
