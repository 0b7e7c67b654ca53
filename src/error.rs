//! Error types for fetching, persistence, importing and configuration.
//!
//! None of these are fatal to a reading session: fetch errors mean "no
//! remote content", storage errors fall back to an empty store, and import
//! errors are shown to the admin without touching the store.

use thiserror::Error;

/// Failure retrieving a remote or `file://` resource.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL could not be parsed or joined against the base.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Transport-level failure (DNS, TLS, connection reset, missing file).
    #[error("Network error for {url}: {reason}")]
    Network { url: String, reason: String },

    /// The body was not the JSON shape we expected.
    #[error("Could not decode {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Failure reading or writing the key-value persistence adapter.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored value for key '{key}' is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Rejection of an admin import payload. Nothing is applied when this is
/// returned.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("{}", invalid_json_message(.message, .backslash_hint))]
    InvalidJson {
        message: String,
        backslash_hint: bool,
    },

    #[error("Payload must be an object with an \"issues\" array")]
    MissingIssues,

    #[error("Issue #{index} is missing a non-empty \"id\"")]
    MissingId { index: usize },

    #[error("Issue #{index} is malformed: {message}")]
    InvalidIssue { index: usize, message: String },
}

fn invalid_json_message(message: &str, backslash_hint: &bool) -> String {
    if *backslash_hint {
        format!(
            "Invalid JSON: {message}. The text contains a lone backslash; \
             write \\\\ for a literal backslash inside JSON strings"
        )
    } else {
        format!("Invalid JSON: {message}")
    }
}

/// Failure of an admin command.
#[derive(Error, Debug)]
pub enum AdminCommandError {
    #[error("Admin access required: pass --admin with the admin query (e.g. \"?admin=<key>\")")]
    AccessDenied,

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Could not serialize export: {0}")]
    Export(#[from] serde_json::Error),
}

/// Failure loading the YAML configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
