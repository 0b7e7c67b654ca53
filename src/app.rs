//! Application root: wires the store, fetcher, resolver and admin gate over
//! one shared persistence adapter and exposes the operations the CLI runs.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::admin::AdminGate;
use crate::config::Config;
use crate::error::{AdminCommandError, FetchError};
use crate::fetcher::{ContentFetcher, HttpFetch};
use crate::image_cache::ImageCache;
use crate::importer::parse_import;
use crate::models::{Issue, ResolvedImage};
use crate::outputs::markdown::{RenderOptions, archive_to_markdown, issue_to_markdown};
use crate::placeholder::{FallbackState, ImageFallback};
use crate::resolver::{ImageResolver, ImageSlot};
use crate::router::Route;
use crate::scrapers::ArticleScraper;
use crate::storage::KeyValueStore;
use crate::store::ContentStore;
use crate::utils::truncate_for_log;

pub struct App<F> {
    store: ContentStore,
    fetcher: ContentFetcher<F>,
    resolver: ImageResolver<F>,
    admin: AdminGate,
}

impl<F: HttpFetch + Clone> App<F> {
    /// Build the application with one transport shared by content fetches and
    /// article scrapes.
    pub fn new(config: &Config, kv: Arc<dyn KeyValueStore>, http: F) -> Result<Self, FetchError> {
        Self::with_transports(config, kv, http.clone(), http)
    }
}

impl<F: HttpFetch> App<F> {
    pub fn with_transports(
        config: &Config,
        kv: Arc<dyn KeyValueStore>,
        content_http: F,
        article_http: F,
    ) -> Result<Self, FetchError> {
        let fetcher = ContentFetcher::new(content_http, &config.content_base_url)?;
        let scraper = ArticleScraper::new(
            article_http,
            config.proxy_prefix.clone(),
            config.extractor.build(),
        );
        let resolver = ImageResolver::new(scraper, ImageCache::new(Arc::clone(&kv)));
        let admin = AdminGate::new(config.admin_key.clone(), Arc::clone(&kv));
        let store = ContentStore::load(kv);
        Ok(Self {
            store,
            fetcher,
            resolver,
            admin,
        })
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Pull the manifest and merge it over the local store, remote winning.
    ///
    /// Fetch failures mean "no remote content" and return 0.
    #[instrument(level = "info", skip_all)]
    pub async fn sync(&mut self) -> usize {
        let remote = match self.fetcher.fetch_manifest_and_issues().await {
            Ok(issues) => issues,
            Err(e) => {
                warn!(error = %e, "Remote content unavailable; using local issues");
                return 0;
            }
        };
        let fetched = remote.len();
        if let Err(e) = self.store.merge_remote(remote) {
            warn!(error = %e, "Could not persist merged issues");
        }
        info!(fetched, total = self.store.len(), "Sync complete");
        fetched
    }

    /// Look up an issue, fetching `<id>.json` if it is not stored locally.
    #[instrument(level = "info", skip(self))]
    pub async fn open_issue(&mut self, id: &str, allow_fetch: bool) -> Option<Issue> {
        if self.store.get(id).is_none() && allow_fetch {
            match self.fetcher.fetch_issue(id).await {
                Ok(issues) => {
                    if let Err(e) = self.store.merge_remote(issues) {
                        warn!(error = %e, "Could not persist fetched issue");
                    }
                }
                Err(e) => debug!(error = %e, "Issue not available remotely"),
            }
        }
        self.store.get(id).cloned()
    }

    /// Resolve every item's image concurrently. With `check_images`, each
    /// image is probed and walked down its fallback chain; `None` marks an
    /// image whose chain was exhausted.
    #[instrument(level = "info", skip_all, fields(issue = %issue.id, items = issue.items.len()))]
    pub async fn resolve_images(&self, issue: &Issue, check_images: bool) -> Vec<Option<ResolvedImage>> {
        let tasks = issue.items.iter().map(|item| async move {
            let slot = ImageSlot::new(item);
            let resolution = match slot.run(&self.resolver, item).await {
                Some(resolution) => resolution,
                None => slot.current()?,
            };
            if !check_images {
                return Some(resolution.image);
            }

            let mut fallback = ImageFallback::new(&resolution.image.src, &resolution.chain);
            match fallback.settle(self.resolver.scraper().http()).await {
                FallbackState::Showing(src) if src == resolution.image.src => Some(resolution.image),
                FallbackState::Showing(src) => Some(ResolvedImage {
                    src,
                    caption: None,
                    credit: None,
                    href: resolution.image.href,
                }),
                FallbackState::Hidden => None,
            }
        });
        join_all(tasks).await
    }

    /// Markdown for the archive, newest first.
    pub fn archive_markdown(&self) -> String {
        archive_to_markdown(&self.store.sorted())
    }

    /// Markdown for `route`.
    pub async fn render_route(
        &mut self,
        route: &Route,
        opts: &RenderOptions,
        allow_fetch: bool,
        check_images: bool,
    ) -> String {
        match route {
            Route::Home => self.archive_markdown(),
            Route::Issue(id) => match self.open_issue(id, allow_fetch).await {
                Some(issue) => {
                    let images = self.resolve_images(&issue, check_images).await;
                    issue_to_markdown(&issue, &images, opts)
                }
                None => format!(
                    "# Issue not found\n\nNo issue with id `{id}`.\n\n[← Archive]({})\n",
                    Route::Home.to_hash()
                ),
            },
        }
    }

    /// Validate and merge an import payload (imported issues win). Returns the
    /// number of imported issues.
    #[instrument(level = "info", skip_all)]
    pub fn import(&mut self, text: &str, admin_query: Option<&str>) -> Result<usize, AdminCommandError> {
        if !self.admin.check(admin_query) {
            return Err(AdminCommandError::AccessDenied);
        }
        let issues = parse_import(text).inspect_err(|e| {
            warn!(error = %e, preview = %truncate_for_log(text, 120), "Import rejected");
        })?;
        let count = issues.len();
        self.store.merge_remote(issues)?;
        info!(count, total = self.store.len(), "Import applied");
        Ok(count)
    }

    /// Pretty-printed export of the whole store.
    pub fn export(&self, admin_query: Option<&str>) -> Result<String, AdminCommandError> {
        if !self.admin.check(admin_query) {
            return Err(AdminCommandError::AccessDenied);
        }
        Ok(self.store.export_json()?)
    }

    /// Run the article scraper directly on one URL.
    pub async fn resolve_article_image(&self, article_url: &str) -> Option<String> {
        self.resolver.scraper().scrape_image(article_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::FakeHttp;
    use crate::storage::MemoryStore;

    const INDEX: &str = "https://digest.example.com/content/index.json";

    fn config() -> Config {
        Config {
            content_base_url: "https://digest.example.com/content/".to_string(),
            admin_key: Some("k".to_string()),
            ..Config::default()
        }
    }

    fn app(content: FakeHttp, articles: FakeHttp) -> App<FakeHttp> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        App::with_transports(&config(), kv, content, articles).unwrap()
    }

    #[tokio::test]
    async fn test_sync_merges_remote() {
        let content = FakeHttp::new().with_body(
            INDEX,
            r#"{"issues": [{"id": "2025-08-18_2025-08-24", "start": "2025-08-18"}, {"id": "2025-08-11_2025-08-17", "start": "2025-08-11"}]}"#,
        );
        let mut app = app(content, FakeHttp::new());
        assert_eq!(app.sync().await, 2);
        assert!(app.archive_markdown().contains("#/issue/2025-08-18_2025-08-24"));
    }

    #[tokio::test]
    async fn test_sync_failure_keeps_local() {
        let mut app = app(FakeHttp::new().with_status(INDEX, 500), FakeHttp::new());
        app.import(r#"{"issues": [{"id": "A"}]}"#, Some("?admin=k")).unwrap();
        assert_eq!(app.sync().await, 0);
        assert_eq!(app.store().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_issue_is_fetched_lazily() {
        let content = FakeHttp::new().with_body(
            "https://digest.example.com/content/2025-08-18_2025-08-24.json",
            r#"{"issues": [{"id": "2025-08-18_2025-08-24", "title": "Week 34", "items": [{"title": "No links"}]}]}"#,
        );
        let mut app = app(content, FakeHttp::new());
        let md = app
            .render_route(
                &Route::parse("#/issue/2025-08-18_2025-08-24"),
                &RenderOptions::default(),
                true,
                false,
            )
            .await;
        assert!(md.contains("# Week 34"));
        assert!(md.contains("picsum.photos"));
        assert!(app.store().get("2025-08-18_2025-08-24").is_some());
    }

    #[tokio::test]
    async fn test_missing_issue_renders_not_found() {
        let mut app = app(FakeHttp::new(), FakeHttp::new());
        let md = app
            .render_route(
                &Route::Issue("2030-01-01_2030-01-07".to_string()),
                &RenderOptions::default(),
                true,
                false,
            )
            .await;
        assert!(md.starts_with("# Issue not found"));
    }

    #[tokio::test]
    async fn test_check_images_falls_back_to_neutral_graphic() {
        let mut app = app(FakeHttp::new(), FakeHttp::new());
        app.import(
            r#"{"issues": [{"id": "A", "items": [{"title": "x", "image": {"src": "https://cdn.test/gone.jpg"}}]}]}"#,
            Some("?admin=k"),
        )
        .unwrap();
        let issue = app.store().get("A").cloned().unwrap();
        let images = app.resolve_images(&issue, true).await;
        let src = &images[0].as_ref().unwrap().src;
        assert!(src.starts_with("data:image/svg+xml"));
    }

    #[test]
    fn test_import_requires_admin() {
        let mut app = app(FakeHttp::new(), FakeHttp::new());
        let err = app.import(r#"{"issues": [{"id": "A"}]}"#, None).unwrap_err();
        assert!(matches!(err, AdminCommandError::AccessDenied));
        assert!(app.store().is_empty());
        assert!(matches!(app.export(Some("?admin=wrong")), Err(AdminCommandError::AccessDenied)));
    }

    #[test]
    fn test_rejected_import_is_not_applied() {
        let mut app = app(FakeHttp::new(), FakeHttp::new());
        let err = app
            .import(r#"{"issues": [{"id": "A"}, {"title": "no id"}]}"#, Some("?admin=k"))
            .unwrap_err();
        assert!(matches!(err, AdminCommandError::Import(_)));
        assert!(app.store().is_empty());
    }

    #[test]
    fn test_export_then_import_is_a_fixed_point() {
        let mut app = app(FakeHttp::new(), FakeHttp::new());
        app.import(
            r#"{"issues": [{"id": "A", "start": "2025-01-01", "marker": "x"}, {"id": "B", "start": "2025-01-08"}]}"#,
            Some("?admin=k"),
        )
        .unwrap();
        let before = app.store().issues().to_vec();

        let exported = app.export(None).unwrap();
        app.import(&exported, None).unwrap();
        assert_eq!(app.store().issues(), before.as_slice());
    }
}
