//! Representative-image scraping for a linked article.
//!
//! Third-party article pages are fetched through a public reader proxy: the
//! article's scheme, host, path and query are appended to a fixed prefix
//! (`https://r.jina.ai/` by default), e.g.
//!
//! ```text
//! https://news.example.com/2025/08/story?id=7
//!   -> https://r.jina.ai/https://news.example.com/2025/08/story?id=7
//! ```
//!
//! The body is handed to an [`ImageExtractor`], the candidates are made
//! absolute, de-duplicated, filtered and ranked, and the best one is returned
//! if it clears the acceptance threshold.

use std::cmp::Reverse;

use itertools::Itertools;
use tracing::{debug, info, instrument};
use url::Url;

use super::{ImageExtractor, absolutize};
use crate::fetcher::HttpFetch;
use crate::scoring::{is_acceptable, is_usable, score};

/// Default reader proxy prefix.
pub const DEFAULT_PROXY_PREFIX: &str = "https://r.jina.ai/";

pub struct ArticleScraper<F> {
    http: F,
    proxy_prefix: String,
    extractor: Box<dyn ImageExtractor>,
}

impl<F: HttpFetch> ArticleScraper<F> {
    pub fn new(http: F, proxy_prefix: impl Into<String>, extractor: Box<dyn ImageExtractor>) -> Self {
        Self {
            http,
            proxy_prefix: proxy_prefix.into(),
            extractor,
        }
    }

    pub fn http(&self) -> &F {
        &self.http
    }

    /// The proxied URL for `article_url`, or `None` if it does not parse or
    /// has no host.
    pub fn proxy_url(&self, article_url: &str) -> Option<String> {
        let url = Url::parse(article_url.trim()).ok()?;
        let host = url.host_str()?;
        let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
        let query = url.query().map(|q| format!("?{q}")).unwrap_or_default();
        Some(format!(
            "{}{}://{}{}{}{}",
            self.proxy_prefix,
            url.scheme(),
            host,
            port,
            url.path(),
            query
        ))
    }

    /// Usable candidates from `html`, best first, with their scores.
    ///
    /// Candidates are made absolute against `base`, de-duplicated keeping the
    /// first occurrence, stripped of disallowed and logo-like URLs, then
    /// stably sorted by score.
    pub fn rank_candidates(&self, html: &str, base: &Url) -> Vec<(String, i32)> {
        let mut ranked: Vec<(String, i32)> = self
            .extractor
            .extract(html)
            .iter()
            .filter_map(|raw| absolutize(base, raw))
            .unique()
            .filter(|u| is_usable(u))
            .map(|u| {
                let s = score(&u);
                (u, s)
            })
            .collect();
        ranked.sort_by_key(|(_, s)| Reverse(*s));
        ranked
    }

    /// Best-effort representative image for `article_url`.
    ///
    /// Returns `None` when the URL is unusable, the proxy fails, or no
    /// candidate scores high enough.
    #[instrument(level = "info", skip(self))]
    pub async fn scrape_image(&self, article_url: &str) -> Option<String> {
        let base = Url::parse(article_url.trim()).ok()?;
        let proxied = self.proxy_url(article_url)?;

        let body = match self.http.get_text(&proxied).await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "Proxy fetch failed");
                return None;
            }
        };

        let ranked = self.rank_candidates(&body, &base);
        debug!(candidates = ranked.len(), "Ranked image candidates");

        let (best, best_score) = ranked.into_iter().next()?;
        if !is_acceptable(best_score) {
            debug!(%best, best_score, "Best candidate below threshold");
            return None;
        }
        info!(image = %best, score = best_score, "Scraped article image");
        Some(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::FakeHttp;
    use crate::scrapers::fixtures::ARTICLE_HTML;
    use crate::scrapers::{HtmlExtractor, PatternExtractor};

    const ARTICLE: &str = "https://news.example.com/2025/08/story.html";
    const PROXIED: &str = "https://r.jina.ai/https://news.example.com/2025/08/story.html";

    fn scraper(http: FakeHttp) -> ArticleScraper<FakeHttp> {
        ArticleScraper::new(http, DEFAULT_PROXY_PREFIX, Box::new(PatternExtractor))
    }

    #[test]
    fn test_proxy_url_keeps_query_drops_fragment() {
        let s = scraper(FakeHttp::new());
        assert_eq!(
            s.proxy_url("https://news.example.com:8443/a/b?x=1&y=2#frag").as_deref(),
            Some("https://r.jina.ai/https://news.example.com:8443/a/b?x=1&y=2")
        );
        assert_eq!(s.proxy_url("not a url"), None);
        assert_eq!(s.proxy_url("mailto:desk@example.com"), None);
    }

    #[test]
    fn test_rank_candidates_filters_and_orders() {
        let s = scraper(FakeHttp::new());
        let base = Url::parse(ARTICLE).unwrap();
        let ranked = s.rank_candidates(ARTICLE_HTML, &base);

        let urls: Vec<&str> = ranked.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/uploads/2025/08/rates-hero.jpg?w=1200&q=80",
                "https://news.example.com/media/share-card.png",
                "https://cdn.example.com/photos/press-conference.webp",
            ]
        );
        assert_eq!(ranked[0].1, 17);
        assert_eq!(ranked[1].1, 15);
        assert_eq!(ranked[2].1, 15);
    }

    #[tokio::test]
    async fn test_scrape_image_returns_best() {
        let s = scraper(FakeHttp::new().with_body(PROXIED, ARTICLE_HTML));
        assert_eq!(
            s.scrape_image(ARTICLE).await.as_deref(),
            Some("https://cdn.example.com/uploads/2025/08/rates-hero.jpg?w=1200&q=80")
        );
    }

    #[tokio::test]
    async fn test_scrape_image_with_dom_extractor() {
        let http = FakeHttp::new().with_body(PROXIED, ARTICLE_HTML);
        let s = ArticleScraper::new(http, DEFAULT_PROXY_PREFIX, Box::new(HtmlExtractor));
        assert!(s.scrape_image(ARTICLE).await.is_some());
    }

    #[tokio::test]
    async fn test_scrape_image_proxy_failure() {
        let s = scraper(FakeHttp::new().with_status(PROXIED, 502));
        assert_eq!(s.scrape_image(ARTICLE).await, None);
        assert_eq!(s.http().call_count(), 1);
    }

    #[tokio::test]
    async fn test_scrape_image_below_threshold() {
        let article = "https://example.org/2025/08/story.html";
        let html = r#"<img src="/pixel"><img src="/brand/logo.png"><img src="/anim.gif">"#;
        let s = scraper(FakeHttp::new().with_body(
            "https://r.jina.ai/https://example.org/2025/08/story.html",
            html,
        ));
        let base = Url::parse(article).unwrap();
        let ranked = s.rank_candidates(html, &base);
        assert_eq!(ranked, vec![("https://example.org/pixel".to_string(), 0)]);
        assert_eq!(s.scrape_image(article).await, None);
        assert_eq!(s.http().call_count(), 1);
    }

    #[tokio::test]
    async fn test_scrape_image_unparseable_url_makes_no_request() {
        let s = scraper(FakeHttp::new());
        assert_eq!(s.scrape_image("::::").await, None);
        assert_eq!(s.http().call_count(), 0);
    }
}
