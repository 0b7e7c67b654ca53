//! # Weekly Digest CLI
//!
//! Syncs the digest archive, prints issues as Markdown on stdout, and runs
//! the admin import/export. Logs go to stderr.
//!
//! ```sh
//! weekly_digest --content-url https://digest.example.com/content/ list
//! weekly_digest show 2025-08-18_2025-08-24
//! ```

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use weekly_digest::App;
use weekly_digest::cli::{Cli, Command};
use weekly_digest::config::Config;
use weekly_digest::fetcher::Transport;
use weekly_digest::outputs::json::{default_export_path, write_export};
use weekly_digest::outputs::markdown::RenderOptions;
use weekly_digest::router::Route;
use weekly_digest::storage::{FileStore, KeyValueStore};
use weekly_digest::utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(url) = &args.content_url {
        config.content_base_url = url.clone();
    }

    if let Err(e) = ensure_writable_dir(&config.data_dir).await {
        error!(
            path = %config.data_dir.display(),
            error = %e,
            "Data directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.data_dir));
    let mut app = App::new(&config, kv, Transport::new())?;
    let online = !args.offline;

    match args.command {
        Command::Sync => {
            let fetched = app.sync().await;
            println!(
                "Fetched {fetched} issues; {} stored locally.",
                app.store().len()
            );
        }
        Command::List => {
            if online {
                app.sync().await;
            }
            print!("{}", app.archive_markdown());
        }
        Command::Show {
            route,
            lang,
            check_images,
        } => {
            if online {
                app.sync().await;
            }
            let opts = RenderOptions {
                lang,
                show_published_at: config.show_published_at,
                show_captions: config.show_captions,
            };
            let route = Route::from_arg(&route);
            info!(%route, "Rendering");
            print!(
                "{}",
                app.render_route(&route, &opts, online, check_images).await
            );
        }
        Command::Import { file, admin } => {
            let text = tokio::fs::read_to_string(&file).await?;
            match app.import(&text, admin.as_deref()) {
                Ok(count) => println!(
                    "Imported {count} issues; {} stored locally.",
                    app.store().len()
                ),
                Err(e) => {
                    eprintln!("Import failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Export { file, admin } => {
            let json = match app.export(admin.as_deref()) {
                Ok(json) => json,
                Err(e) => {
                    eprintln!("Export failed: {e}");
                    std::process::exit(1);
                }
            };
            let path = file.unwrap_or_else(default_export_path);
            write_export(&json, &path).await?;
            println!("Exported {} issues to {}", app.store().len(), path.display());
        }
        Command::ResolveImage { url } => match app.resolve_article_image(&url).await {
            Some(image) => println!("{image}"),
            None => println!("No usable image found for {url}"),
        },
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
