//! JSON export files.
//!
//! The export is the whole persisted store as pretty-printed
//! `{ "issues": [...] }`, suitable for pasting back into `import`.
//! When no file name is given it is written as
//! `weekly-digest-export-YYYY-MM-DD.json` in the current directory.

use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs;
use tracing::{error, info, instrument};

/// Default export file name for today's date.
pub fn default_export_path() -> PathBuf {
    PathBuf::from(format!(
        "weekly-digest-export-{}.json",
        Local::now().date_naive()
    ))
}

/// Write `json` to `path`, creating parent directories as needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_export(json: &str, path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create export dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(bytes = json.len(), "Wrote export file");
    Ok(())
}
