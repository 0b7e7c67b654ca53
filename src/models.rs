//! Data models for digest issues, their news items, and resolved images.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Issue`]: One published weekly digest, keyed by its date-range id
//! - [`Item`]: One bilingual news entry inside an issue
//! - [`ContentPayload`]: The `{ "issues": [...] }` envelope used on the wire and on disk
//! - [`ResolvedImage`]: The image chosen for display after resolution
//!
//! The JSON field names are camelCase with upper-case language suffixes
//! (`summaryCN`, `factsEN`), so fields carry explicit `#[serde(rename)]`
//! attributes. Unknown fields are kept in an `extra` map so that data written
//! by newer producers survives an export/import round trip untouched.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// A single weekly digest.
///
/// `id` has the form `YYYY-MM-DD_YYYY-MM-DD` and is the only merge key; an
/// issue arriving with an id already present replaces the stored one as a
/// whole.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Issue {
    /// Date-range identifier, e.g. `2025-08-18_2025-08-24`.
    #[serde(default)]
    pub id: String,
    /// First day covered by the issue (`YYYY-MM-DD`).
    #[serde(default)]
    pub start: String,
    /// Last day covered by the issue (`YYYY-MM-DD`).
    #[serde(default)]
    pub end: String,
    /// Publication timestamp in RFC 3339 form.
    #[serde(rename = "publishedAt", default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "summaryCN", default, skip_serializing_if = "Option::is_none")]
    pub summary_cn: Option<String>,
    #[serde(rename = "summaryEN", default, skip_serializing_if = "Option::is_none")]
    pub summary_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<Cover>,
    #[serde(default)]
    pub items: Vec<Item>,
    /// Fields this version does not model, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Issue {
    /// Parse `start` as a calendar date.
    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.start, "%Y-%m-%d").ok()
    }

    /// Parse `publishedAt` as an RFC 3339 timestamp.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        self.published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }

    /// The title to show, falling back to the date range.
    pub fn display_title(&self) -> String {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => format!("{} – {}", self.start, self.end),
        }
    }
}

/// Cover image of an issue.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Cover {
    #[serde(default)]
    pub src: String,
}

/// One news entry within an issue.
///
/// Items have no identity of their own; they live and die with the parent
/// [`Issue`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Item {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "factsCN", default, skip_serializing_if = "Option::is_none")]
    pub facts_cn: Option<Vec<String>>,
    #[serde(rename = "factsEN", default, skip_serializing_if = "Option::is_none")]
    pub facts_en: Option<Vec<String>>,
    #[serde(rename = "keyInfo", default, skip_serializing_if = "Option::is_none")]
    pub key_info: Option<KeyInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ItemImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
    #[serde(rename = "whyCN", default, skip_serializing_if = "Option::is_none")]
    pub why_cn: Option<String>,
    #[serde(rename = "whyEN", default, skip_serializing_if = "Option::is_none")]
    pub why_en: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// URL of the first source link, if it is non-empty.
    pub fn first_link(&self) -> Option<&Link> {
        self.links
            .as_ref()
            .and_then(|links| links.first())
            .filter(|l| !l.url.trim().is_empty())
    }

    /// The explicit image `src`, if one is set and non-empty.
    pub fn explicit_src(&self) -> Option<&str> {
        self.image
            .as_ref()
            .and_then(|img| img.src.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Structured "key info" block of an item.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct KeyInfo {
    /// Event time in Singapore time, free-form.
    #[serde(rename = "timeSGT", default, skip_serializing_if = "Option::is_none")]
    pub time_sgt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

/// Image explicitly attached to an item by its author.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ItemImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// A source article link.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Link {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The image finally chosen for an item. Derived at display time, never part
/// of the persisted content.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResolvedImage {
    pub src: String,
    pub caption: Option<String>,
    pub credit: Option<String>,
    pub href: Option<String>,
}

/// The `{ "issues": [...] }` envelope shared by per-issue resources, import
/// payloads, exports and the persisted store.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ContentPayload {
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// Decode an `issues` array one entry at a time, skipping entries that do not
/// decode as an [`Issue`].
///
/// Accepts either the envelope object or a bare array. Anything else yields an
/// empty list.
pub fn decode_issues_lenient(value: Value) -> Vec<Issue> {
    let entries = match value {
        Value::Object(mut obj) => match obj.remove("issues") {
            Some(Value::Array(arr)) => arr,
            _ => return Vec::new(),
        },
        Value::Array(arr) => arr,
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Issue>(entry) {
            Ok(issue) => Some(issue),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed issue entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_deserialization_with_renamed_fields() {
        let json = r#"{
            "id": "2025-08-18_2025-08-24",
            "start": "2025-08-18",
            "end": "2025-08-24",
            "publishedAt": "2025-08-25T09:00:00+08:00",
            "summaryCN": "本周要闻",
            "summaryEN": "This week",
            "items": [{
                "title": "Rate decision",
                "factsEN": ["Held at 4%"],
                "keyInfo": {"timeSGT": "14:00", "actor": "MAS"},
                "links": [{"url": "https://example.com/a", "label": "Example"}]
            }]
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.id, "2025-08-18_2025-08-24");
        assert_eq!(issue.summary_cn.as_deref(), Some("本周要闻"));
        assert_eq!(issue.items[0].facts_en.as_ref().unwrap()[0], "Held at 4%");
        assert_eq!(
            issue.items[0].key_info.as_ref().unwrap().time_sgt.as_deref(),
            Some("14:00")
        );
        assert_eq!(
            issue.start_date(),
            NaiveDate::from_ymd_opt(2025, 8, 18)
        );
        assert!(issue.published_at().is_some());
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let value = json!({"id": "B", "start": "2025-02-02", "marker": "remote"});
        let issue: Issue = serde_json::from_value(value).unwrap();
        assert_eq!(issue.extra.get("marker"), Some(&json!("remote")));

        let back = serde_json::to_value(&issue).unwrap();
        assert_eq!(back["marker"], json!("remote"));
        assert!(back.get("publishedAt").is_none());
    }

    #[test]
    fn test_display_title_falls_back_to_range() {
        let issue = Issue {
            id: "2025-01-06_2025-01-12".to_string(),
            start: "2025-01-06".to_string(),
            end: "2025-01-12".to_string(),
            ..Default::default()
        };
        assert_eq!(issue.display_title(), "2025-01-06 – 2025-01-12");
    }

    #[test]
    fn test_first_link_ignores_blank_url() {
        let item = Item {
            links: Some(vec![Link {
                url: "  ".to_string(),
                label: None,
            }]),
            ..Default::default()
        };
        assert!(item.first_link().is_none());
        assert!(item.explicit_src().is_none());
    }

    #[test]
    fn test_decode_issues_lenient_skips_malformed() {
        let value = json!({
            "issues": [
                {"id": "A", "start": "2025-01-01"},
                {"id": "B", "items": "not-a-list"},
                {"id": "C"}
            ]
        });
        let ids: Vec<String> = decode_issues_lenient(value)
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[test]
    fn test_decode_issues_lenient_non_object() {
        assert!(decode_issues_lenient(json!("nope")).is_empty());
        assert!(decode_issues_lenient(json!({"files": []})).is_empty());
    }
}
