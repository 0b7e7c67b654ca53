//! Id-keyed merge of issue collections.
//!
//! The merge is "remote wins": local issues are inserted first, then remote
//! issues, and a remote issue replaces a local one with the same id in full.
//! There is no timestamp comparison and no field-level merge. The result keeps
//! first-insertion order, so a replaced issue stays where the local copy was.

use std::collections::HashMap;

use crate::models::Issue;

/// Merge `remote` into `local`, remote winning on id collisions.
///
/// Issues whose id is empty or whitespace are dropped without error.
/// The output is not sorted; see [`sort_for_display`].
pub fn merge(local: Vec<Issue>, remote: Vec<Issue>) -> Vec<Issue> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<Issue> = Vec::with_capacity(local.len() + remote.len());

    for issue in local.into_iter().chain(remote) {
        if issue.id.trim().is_empty() {
            continue;
        }
        match slots.get(&issue.id) {
            Some(&pos) => merged[pos] = issue,
            None => {
                slots.insert(issue.id.clone(), merged.len());
                merged.push(issue);
            }
        }
    }

    merged
}

/// Sort issues newest first by `start` date.
///
/// Issues whose `start` does not parse sort after all dated issues; ties are
/// broken by id, descending.
pub fn sort_for_display(issues: &mut [Issue]) {
    issues.sort_by(|a, b| {
        b.start_date()
            .cmp(&a.start_date())
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn issue(value: serde_json::Value) -> Issue {
        serde_json::from_value(value).unwrap()
    }

    fn ids(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_merge_remote_wins_and_keeps_union() {
        let local = vec![
            issue(json!({"id": "A", "start": "2025-01-01"})),
            issue(json!({"id": "B", "start": "2025-01-02"})),
        ];
        let remote = vec![
            issue(json!({"id": "B", "start": "2025-02-02", "marker": "remote"})),
            issue(json!({"id": "C", "start": "2025-01-03"})),
        ];

        let merged = merge(local, remote);
        let got: BTreeSet<&str> = ids(&merged).into_iter().collect();
        assert_eq!(got, BTreeSet::from(["A", "B", "C"]));

        let b = merged.iter().find(|i| i.id == "B").unwrap();
        assert_eq!(b.extra.get("marker"), Some(&json!("remote")));
        assert_eq!(b.start, "2025-02-02");
    }

    #[test]
    fn test_merge_keeps_first_insertion_order() {
        let local = vec![
            issue(json!({"id": "A"})),
            issue(json!({"id": "B"})),
        ];
        let remote = vec![issue(json!({"id": "C"})), issue(json!({"id": "A", "title": "new"}))];

        let merged = merge(local, remote);
        assert_eq!(ids(&merged), vec!["A", "B", "C"]);
        assert_eq!(merged[0].title.as_deref(), Some("new"));
    }

    #[test]
    fn test_merge_replaces_whole_object() {
        let local = vec![issue(json!({"id": "A", "title": "local", "summaryEN": "keep?"}))];
        let remote = vec![issue(json!({"id": "A", "title": "remote"}))];

        let merged = merge(local, remote);
        assert_eq!(merged[0].title.as_deref(), Some("remote"));
        assert!(merged[0].summary_en.is_none());
    }

    #[test]
    fn test_merge_drops_missing_ids() {
        let local = vec![issue(json!({"start": "2025-01-01"})), issue(json!({"id": "A"}))];
        let remote = vec![issue(json!({"id": "  "}))];

        let merged = merge(local, remote);
        assert_eq!(ids(&merged), vec!["A"]);
    }

    #[test]
    fn test_merge_is_idempotent_on_remote() {
        let local = vec![
            issue(json!({"id": "A", "start": "2025-01-01"})),
            issue(json!({"id": "B", "start": "2025-01-02"})),
        ];
        let remote = vec![
            issue(json!({"id": "B", "start": "2025-02-02", "marker": "remote"})),
            issue(json!({"id": "C", "start": "2025-01-03"})),
        ];

        let once = merge(local, remote.clone());
        let twice = merge(once.clone(), remote);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_duplicate_ids_within_remote_last_wins() {
        let remote = vec![
            issue(json!({"id": "A", "title": "first"})),
            issue(json!({"id": "A", "title": "second"})),
        ];
        let merged = merge(Vec::new(), remote);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title.as_deref(), Some("second"));
    }

    #[test]
    fn test_sort_for_display_newest_first() {
        let mut issues = vec![
            issue(json!({"id": "A", "start": "2025-01-01"})),
            issue(json!({"id": "X", "start": "garbage"})),
            issue(json!({"id": "C", "start": "2025-03-01"})),
            issue(json!({"id": "B", "start": "2025-02-01"})),
        ];
        sort_for_display(&mut issues);
        assert_eq!(ids(&issues), vec!["C", "B", "A", "X"]);
    }
}
