//! Output generation for the terminal and for export files.
//!
//! # Submodules
//!
//! - [`markdown`]: Renders the archive list and single issues as Markdown
//! - [`json`]: Writes the pretty-printed store export
//!
//! # Output
//!
//! ```text
//! stdout                                   # archive / issue Markdown
//! weekly-digest-export-2025-08-25.json     # `export` without a file name
//! ```

pub mod json;
pub mod markdown;
