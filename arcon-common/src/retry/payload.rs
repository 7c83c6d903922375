//! Translation of the client-held retry tree into the backend's wire shape
//!
//! # Index rules
//! - Entry with a numeric `audioID`: wire `index` is the `audioID`.
//! - `from_script`: the client index is already relative to the canonical
//!   script and passes through unchanged.
//! - Otherwise: the 0-based client index becomes the 1-based upstream index.
//!
//! # Envelope
//! ```text
//! { "task": <artifact id>, "retry": { "sections": [ ... ] } | null }
//! ```

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::{RetryData, RetryTextEntry};

/// One normalized clip override
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireEntry {
    pub index: i64,

    /// Outer `None`: the entry never carried the field, so it is omitted.
    /// `Some(None)`: an explicit `null` is sent.
    #[serde(rename = "textToUse", skip_serializing_if = "Option::is_none")]
    pub text_to_use: Option<Option<String>>,

    pub regen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireSection {
    #[serde(rename = "sectionId")]
    pub section_id: i64,
    #[serde(rename = "remakeALL")]
    pub remake_all: bool,
    pub texts: Vec<WireEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WireRetry {
    pub sections: Vec<WireSection>,
}

/// Body of the upstream update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryEnvelope {
    pub task: String,
    pub retry: Option<WireRetry>,
}

impl RetryEnvelope {
    /// Envelope for a stored tree; `None` means "no retry block"
    pub fn from_retry_data(task: impl Into<String>, data: Option<&RetryData>, from_script: bool) -> Self {
        Self {
            task: task.into(),
            retry: data.map(|d| normalize_retry(d, from_script)),
        }
    }

    /// Envelope for a loosely shaped client retry block
    pub fn from_client_json(task: impl Into<String>, retry: Option<&Value>, from_script: bool) -> Self {
        Self {
            task: task.into(),
            retry: normalize_client_retry(retry, from_script),
        }
    }
}

fn wire_index(audio_id: Option<i64>, index: i64, from_script: bool) -> i64 {
    match audio_id {
        Some(id) => id,
        None if from_script => index,
        None => index + 1,
    }
}

fn normalize_entry(entry: &RetryTextEntry, from_script: bool) -> WireEntry {
    WireEntry {
        index: wire_index(entry.audio_id, entry.index, from_script),
        // Stored entries always carry the field
        text_to_use: Some(entry.text_to_use.clone()),
        regen: entry.regen,
    }
}

/// Normalize a typed tree, one wire entry per stored entry
pub fn normalize_retry(data: &RetryData, from_script: bool) -> WireRetry {
    WireRetry {
        sections: data
            .sections
            .iter()
            .map(|section| WireSection {
                section_id: section.section_id,
                remake_all: section.remake_all,
                texts: section
                    .texts
                    .iter()
                    .map(|e| normalize_entry(e, from_script))
                    .collect(),
            })
            .collect(),
    }
}

/// Normalize an untyped retry block as received from a client
///
/// Returns `None` when the block is absent, `null`, not an object, or has no
/// `sections` array. Sections without a numeric `sectionId`, entries without
/// a usable index and entries whose `textToUse` is not a string or `null` are
/// dropped with a warning.
pub fn normalize_client_retry(retry: Option<&Value>, from_script: bool) -> Option<WireRetry> {
    let sections = retry?.as_object()?.get("sections")?.as_array()?;

    let sections = sections
        .iter()
        .enumerate()
        .filter_map(|(position, raw)| {
            let raw = raw.as_object().or_else(|| {
                warn!(position, "Dropping retry section: not an object");
                None
            })?;
            let section_id = raw.get("sectionId").and_then(Value::as_i64).or_else(|| {
                warn!(position, "Dropping retry section: missing numeric sectionId");
                None
            })?;

            let texts = raw
                .get("texts")
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|e| normalize_client_entry(section_id, e, from_script))
                        .collect()
                })
                .unwrap_or_default();

            Some(WireSection {
                section_id,
                remake_all: raw.get("remakeALL").is_some_and(is_truthy),
                texts,
            })
        })
        .collect();

    Some(WireRetry { sections })
}

fn normalize_client_entry(section_id: i64, raw: &Value, from_script: bool) -> Option<WireEntry> {
    let Some(raw) = raw.as_object() else {
        warn!(section_id, "Dropping retry entry: not an object");
        return None;
    };

    let audio_id = raw.get("audioID").and_then(Value::as_i64);
    let index = match (audio_id, raw.get("index").and_then(Value::as_i64)) {
        (Some(id), _) => id,
        (None, Some(index)) => wire_index(None, index, from_script),
        (None, None) => {
            warn!(section_id, "Dropping retry entry: neither audioID nor index is numeric");
            return None;
        }
    };

    // Absent key stays absent; explicit null is kept
    let text_to_use = match raw.get("textToUse") {
        None => None,
        Some(Value::Null) => Some(None),
        Some(Value::String(text)) => Some(Some(text.clone())),
        Some(_) => {
            warn!(section_id, index, "Dropping retry entry: textToUse is neither a string nor null");
            return None;
        }
    };

    Some(WireEntry {
        index,
        text_to_use,
        regen: raw.get("regen").is_some_and(is_truthy),
    })
}

/// Loose truthiness for flags coming from untyped clients
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
