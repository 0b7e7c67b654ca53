//! Command-line interface definitions for Weekly Digest.
//!
//! Global options can also come from the environment; per-command options
//! override the YAML config file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::outputs::markdown::Lang;

/// Command-line arguments for the Weekly Digest reader.
///
/// # Examples
///
/// ```sh
/// # Sync from the configured content URL and list the archive
/// weekly_digest --config digest.yaml list
///
/// # Read one issue, Chinese only, probing images
/// weekly_digest show '#/issue/2025-08-18_2025-08-24' --lang cn --check-images
///
/// # Admin import
/// weekly_digest import week34.json --admin '?admin=s3cret'
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "WEEKLY_DIGEST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory for persisted issues, image cache and admin flag
    #[arg(short, long, env = "WEEKLY_DIGEST_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the content directory (holds index.json)
    #[arg(long, env = "WEEKLY_DIGEST_CONTENT_URL", global = true)]
    pub content_url: Option<String>,

    /// Do not fetch remote content; read the local store only
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the manifest and merge remote issues into the local store
    Sync,

    /// Print the archive, newest issue first
    List,

    /// Print one issue, given a route (#/issue/<id>) or a bare issue id
    Show {
        route: String,

        /// Which language to print
        #[arg(long, value_enum, default_value_t = Lang::Both)]
        lang: Lang,

        /// Probe each image and walk its fallback chain on failure
        #[arg(long)]
        check_images: bool,
    },

    /// Import a `{ "issues": [...] }` JSON file (admin only)
    Import {
        file: PathBuf,

        /// Admin query string, e.g. "?admin=<key>"
        #[arg(long)]
        admin: Option<String>,
    },

    /// Export the whole store as pretty-printed JSON (admin only)
    Export {
        /// Output file; defaults to weekly-digest-export-<date>.json
        file: Option<PathBuf>,

        /// Admin query string, e.g. "?admin=<key>"
        #[arg(long)]
        admin: Option<String>,
    },

    /// Scrape a representative image for one article URL
    ResolveImage { url: String },
}
