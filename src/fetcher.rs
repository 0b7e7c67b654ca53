//! Remote content retrieval.
//!
//! Content is static JSON under a base URL:
//!
//! ```text
//! <base>/index.json            manifest: { "issues": [...] } or { "files": ["a.json", ...] }
//! <base>/<issue-id>.json       { "issues": [...] }, fetched for unknown permalinks
//! ```
//!
//! The transport is behind [`HttpFetch`] so the fetcher and the article
//! scraper can be exercised without a network. [`Transport`] is the real
//! implementation: `reqwest` for `http(s)://` and `tokio::fs` for `file://`,
//! which lets a local checkout of the content directory act as the remote.
//!
//! Every error here is recoverable. Callers log it and carry on with what
//! they already have; nothing is retried.

use futures::future::join_all;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::FetchError;
use crate::models::{Issue, decode_issues_lenient};

/// Minimal async transport used by the fetcher and the article scraper.
pub trait HttpFetch {
    /// GET `url` and return the body as text. Non-success statuses are errors.
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;

    /// Whether `url` currently loads successfully.
    async fn probe(&self, url: &str) -> bool;
}

/// Production transport.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(concat!("weekly_digest/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });
        Self { client }
    }
}

impl HttpFetch for Transport {
    #[instrument(level = "debug", skip(self))]
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if parsed.scheme() == "file" {
            let path = parsed.to_file_path().map_err(|()| FetchError::InvalidUrl {
                url: url.to_string(),
                reason: "not a local path".to_string(),
            })?;
            return tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| FetchError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
        }

        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let resp = self.client.get(parsed).send().await.map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.text().await.map_err(network)?;
        debug!(bytes = body.len(), "Fetched");
        Ok(body)
    }

    #[instrument(level = "debug", skip(self))]
    async fn probe(&self, url: &str) -> bool {
        if url.starts_with("data:") {
            return true;
        }
        match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "file" => parsed
                .to_file_path()
                .map(|p| p.exists())
                .unwrap_or(false),
            Ok(parsed) => match self.client.get(parsed).send().await {
                Ok(resp) => resp.status().is_success(),
                Err(e) => {
                    debug!(error = %e, "Probe failed");
                    false
                }
            },
            Err(_) => false,
        }
    }
}

/// Fetches the manifest and issue payloads relative to a base URL.
#[derive(Debug)]
pub struct ContentFetcher<F> {
    http: F,
    base: Url,
}

impl<F: HttpFetch> ContentFetcher<F> {
    /// Create a fetcher for `base_url`. A trailing `/` is added when missing so
    /// resource names resolve inside the base rather than next to it.
    pub fn new(http: F, base_url: &str) -> Result<Self, FetchError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized).map_err(|e| FetchError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { http, base })
    }

    pub fn http(&self) -> &F {
        &self.http
    }

    fn resource_url(&self, name: &str) -> Result<String, FetchError> {
        self.base
            .join(name)
            .map(|u| u.to_string())
            .map_err(|e| FetchError::InvalidUrl {
                url: name.to_string(),
                reason: e.to_string(),
            })
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let body = self.http.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fetch `index.json` and every issue it points to.
    ///
    /// A manifest embedding `issues` is used as-is. A manifest listing `files`
    /// has every file fetched concurrently; a file that fails contributes
    /// nothing and the rest are concatenated in manifest order.
    #[instrument(level = "info", skip(self), fields(base = %self.base))]
    pub async fn fetch_manifest_and_issues(&self) -> Result<Vec<Issue>, FetchError> {
        let url = self.resource_url("index.json")?;
        let manifest = self.get_json(&url).await?;

        if manifest.get("issues").is_some_and(Value::is_array) {
            let issues = decode_issues_lenient(manifest);
            info!(count = issues.len(), "Manifest embeds issues");
            return Ok(issues);
        }

        let Some(files) = manifest.get("files").and_then(Value::as_array) else {
            return Err(FetchError::Decode {
                url,
                reason: "manifest has neither \"issues\" nor \"files\"".to_string(),
            });
        };
        let files: Vec<String> = files
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        info!(files = files.len(), "Manifest lists issue files");

        let batches = join_all(files.iter().map(|file| self.fetch_file(file))).await;
        let issues: Vec<Issue> = batches.into_iter().flatten().collect();
        info!(count = issues.len(), "Fetched issues from manifest files");
        Ok(issues)
    }

    async fn fetch_file(&self, file: &str) -> Vec<Issue> {
        let url = match self.resource_url(file) {
            Ok(url) => url,
            Err(e) => {
                warn!(%file, error = %e, "Skipping manifest entry");
                return Vec::new();
            }
        };
        match self.get_json(&url).await {
            Ok(value) => decode_issues_lenient(value),
            Err(e) => {
                warn!(%url, error = %e, "Manifest file failed; treating as empty");
                Vec::new()
            }
        }
    }

    /// Fetch `<id>.json` for a permalink that is not in the local store.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_issue(&self, id: &str) -> Result<Vec<Issue>, FetchError> {
        let name = format!("{}.json", urlencoding::encode(id));
        let url = self.resource_url(&name)?;
        let value = self.get_json(&url).await?;
        let issues = decode_issues_lenient(value);
        debug!(count = issues.len(), "Fetched single issue resource");
        Ok(issues)
    }
}
