//! Structural checks run before a retry tree is submitted
//!
//! Validation only reports; it never repairs the tree.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use tracing::warn;

use super::payload::WireRetry;
use super::RetryData;

/// What is wrong with a section or entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    #[error("full remake requested but clip overrides are present")]
    RemakeAllWithOverrides,

    #[error("no full remake and no clip overrides")]
    EmptySection,

    #[error("neither replacement text nor regeneration requested")]
    MissingText,

    #[error("regeneration requested but replacement text is also set")]
    RegenWithText,

    #[error("section appears more than once")]
    DuplicateSection,
}

/// One validation failure, localized to a section and optionally an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    #[serde(rename = "sectionId")]
    pub section_id: i64,

    /// Position of the entry inside the section's `texts`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<usize>,

    pub kind: IssueKind,

    pub message: String,
}

impl ValidationIssue {
    fn new(section_id: i64, entry: Option<usize>, kind: IssueKind) -> Self {
        let message = match entry {
            Some(position) => format!("section {} entry {}: {}", section_id, position, kind),
            None => format!("section {}: {}", section_id, kind),
        };
        Self {
            section_id,
            entry,
            kind,
            message,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Text state of one entry as far as validation cares
struct EntryShape {
    regen: bool,
    /// `textToUse` is a non-empty string
    has_text: bool,
    /// `textToUse` is present and not null
    text_set: bool,
}

/// Accumulates issues across sections
#[derive(Default)]
struct Checker {
    issues: Vec<ValidationIssue>,
    seen: HashSet<i64>,
}

impl Checker {
    fn section(&mut self, id: i64, remake_all: bool, entries: Vec<EntryShape>) {
        if !self.seen.insert(id) {
            self.issues.push(ValidationIssue::new(id, None, IssueKind::DuplicateSection));
        }

        if remake_all {
            if !entries.is_empty() {
                self.issues.push(ValidationIssue::new(id, None, IssueKind::RemakeAllWithOverrides));
            }
            return;
        }

        if entries.is_empty() {
            self.issues.push(ValidationIssue::new(id, None, IssueKind::EmptySection));
            return;
        }

        for (position, entry) in entries.iter().enumerate() {
            if !entry.regen && !entry.has_text {
                self.issues.push(ValidationIssue::new(id, Some(position), IssueKind::MissingText));
            }
            if entry.regen && entry.text_set {
                self.issues.push(ValidationIssue::new(id, Some(position), IssueKind::RegenWithText));
            }
        }
    }

    fn finish(self) -> Result<(), Vec<ValidationIssue>> {
        if self.issues.is_empty() {
            return Ok(());
        }
        for issue in &self.issues {
            warn!("Retry validation failed: {}", issue);
        }
        Err(self.issues)
    }
}

/// Check every section and entry; `None` ("no changes") is always valid
pub fn validate(data: Option<&RetryData>) -> Result<(), Vec<ValidationIssue>> {
    let Some(data) = data else {
        return Ok(());
    };

    let mut checker = Checker::default();
    for section in &data.sections {
        let entries = section
            .texts
            .iter()
            .map(|e| EntryShape {
                regen: e.regen,
                has_text: e.text_to_use.as_deref().is_some_and(|t| !t.is_empty()),
                text_set: e.text_to_use.is_some(),
            })
            .collect();
        checker.section(section.section_id, section.remake_all, entries);
    }
    checker.finish()
}

/// Same rules over an already normalized block, as built from client JSON
pub fn validate_wire(retry: Option<&WireRetry>) -> Result<(), Vec<ValidationIssue>> {
    let Some(retry) = retry else {
        return Ok(());
    };

    let mut checker = Checker::default();
    for section in &retry.sections {
        let entries = section
            .texts
            .iter()
            .map(|e| {
                let text = e.text_to_use.as_ref().and_then(Option::as_deref);
                EntryShape {
                    regen: e.regen,
                    has_text: text.is_some_and(|t| !t.is_empty()),
                    text_set: text.is_some(),
                }
            })
            .collect();
        checker.section(section.section_id, section.remake_all, entries);
    }
    checker.finish()
}

/// Boolean form of [`validate`]
pub fn is_valid(data: Option<&RetryData>) -> bool {
    validate(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::payload::normalize_client_retry;
    use serde_json::json;

    fn data(value: serde_json::Value) -> RetryData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_none_is_valid() {
        assert!(is_valid(None));
        assert!(is_valid(Some(&RetryData::default())));
    }

    #[test]
    fn test_entry_with_neither_text_nor_regen() {
        let d = data(json!({"sections": [{"sectionId": 1, "remakeALL": false,
            "texts": [{"index": 0, "textToUse": null, "regen": false}]}]}));

        let issues = validate(Some(&d)).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].section_id, 1);
        assert_eq!(issues[0].entry, Some(0));
        assert_eq!(issues[0].kind, IssueKind::MissingText);
    }

    #[test]
    fn test_empty_text_counts_as_missing() {
        let d = data(json!({"sections": [{"sectionId": 1, "remakeALL": false,
            "texts": [{"index": 0, "textToUse": "", "regen": false}]}]}));
        assert!(!is_valid(Some(&d)));
    }

    #[test]
    fn test_regen_with_text() {
        let d = data(json!({"sections": [{"sectionId": 2, "remakeALL": false,
            "texts": [{"index": 0, "textToUse": "hi", "regen": false},
                      {"index": 1, "textToUse": "x", "regen": true}]}]}));

        let issues = validate(Some(&d)).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].entry, Some(1));
        assert_eq!(issues[0].kind, IssueKind::RegenWithText);
    }

    #[test]
    fn test_section_rules() {
        let d = data(json!({"sections": [
            {"sectionId": 1, "remakeALL": true, "texts": [{"index": 0, "regen": true}]},
            {"sectionId": 2, "remakeALL": false, "texts": []},
            {"sectionId": 3, "remakeALL": true, "texts": []}
        ]}));

        let kinds: Vec<(i64, IssueKind)> = validate(Some(&d))
            .unwrap_err()
            .into_iter()
            .map(|i| (i.section_id, i.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![(1, IssueKind::RemakeAllWithOverrides), (2, IssueKind::EmptySection)]
        );
    }

    #[test]
    fn test_duplicate_section() {
        let d = data(json!({"sections": [
            {"sectionId": 4, "remakeALL": true},
            {"sectionId": 4, "remakeALL": true}
        ]}));
        let issues = validate(Some(&d)).unwrap_err();
        assert_eq!(issues[0].kind, IssueKind::DuplicateSection);
        assert!(issues[0].to_string().contains("section 4"));
    }

    #[test]
    fn test_wire_block_same_rules() {
        let retry = json!({"sections": [
            {"sectionId": 1, "remakeALL": false, "texts": []},
            {"sectionId": 2, "remakeALL": true, "texts": [{"index": 0, "textToUse": "x", "regen": true}]},
            {"sectionId": 3, "remakeALL": false, "texts": [{"index": 0, "textToUse": null, "regen": false}]},
            {"sectionId": 5, "remakeALL": false, "texts": [{"index": 0, "regen": true}]}
        ]});
        let wire = normalize_client_retry(Some(&retry), false).unwrap();

        let kinds: Vec<(i64, IssueKind)> = validate_wire(Some(&wire))
            .unwrap_err()
            .into_iter()
            .map(|i| (i.section_id, i.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (1, IssueKind::EmptySection),
                (2, IssueKind::RemakeAllWithOverrides),
                (3, IssueKind::MissingText)
            ]
        );
    }

    #[test]
    fn test_wire_null_block_is_valid() {
        assert!(validate_wire(None).is_ok());

        let retry = json!({"sections": [{"sectionId": 1, "texts": [
            {"index": 0, "textToUse": null, "regen": true},
            {"index": 1, "textToUse": "x"}
        ]}]});
        let wire = normalize_client_retry(Some(&retry), true).unwrap();
        assert!(validate_wire(Some(&wire)).is_ok());
    }
}
