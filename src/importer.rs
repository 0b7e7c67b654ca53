//! Validation of admin-pasted import payloads.
//!
//! An import must be `{ "issues": [...] }` where every issue has a non-empty
//! string `id`. Validation is all-or-nothing: the first problem rejects the
//! whole payload and nothing is merged.

use serde_json::Value;

use crate::error::ImportError;
use crate::models::Issue;

/// Parse and validate `text`.
pub fn parse_import(text: &str) -> Result<Vec<Issue>, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ImportError::InvalidJson {
        message: e.to_string(),
        backslash_hint: has_lone_backslash(text),
    })?;

    let Some(entries) = value.get("issues").and_then(Value::as_array) else {
        return Err(ImportError::MissingIssues);
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let has_id = entry
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| !id.trim().is_empty());
            if !has_id {
                return Err(ImportError::MissingId { index });
            }
            serde_json::from_value::<Issue>(entry.clone()).map_err(|e| ImportError::InvalidIssue {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

/// True if `text` has a backslash that does not start a valid JSON escape,
/// typically a Windows path or a regex pasted into a string.
fn has_lone_backslash(text: &str) -> bool {
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            continue;
        }
        match chars.next() {
            Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u') => {}
            _ => return true,
        }
    }
    false
}
