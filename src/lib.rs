//! # Weekly Digest
//!
//! A reader for an archive of bilingual weekly news digests. Issues are
//! published as static JSON, synced into a local key-value store, merged with
//! admin-imported data, and rendered as Markdown. Every news item gets a
//! best-effort representative image scraped from its source article.
//!
//! ## Architecture
//!
//! Leaves first:
//! 1. [`fetcher`]: manifest and per-issue JSON over `http(s)://` or `file://`
//! 2. [`merge`] / [`store`] / [`storage`]: id-keyed "remote wins" merge over an
//!    injected persistence adapter
//! 3. [`scoring`]: pure filters and scores for candidate image URLs
//! 4. [`scrapers`]: article image extraction through a reader proxy
//! 5. [`resolver`] / [`image_cache`] / [`placeholder`]: explicit → cached →
//!    scraped → placeholder, plus the render-time fallback chain
//! 6. [`router`], [`outputs`], [`importer`], [`admin`], [`app`]: the reading
//!    and admin surface driven by the CLI

pub mod admin;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod image_cache;
pub mod importer;
pub mod merge;
pub mod models;
pub mod outputs;
pub mod placeholder;
pub mod resolver;
pub mod router;
pub mod scoring;
pub mod scrapers;
pub mod storage;
pub mod store;
pub mod utils;

pub use app::App;
pub use merge::merge;
pub use models::{Issue, Item, ResolvedImage};
