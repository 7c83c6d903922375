//! Historical correction feed
//!
//! The upstream history collaborator hands over loosely shaped JSON: a list of
//! error blocks (`{"toRetry": [...]}`, one per retry round) plus a separate
//! list of manually supplied corrections. It is parsed here into typed
//! records and checked before the deduplicator sees it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// One historical error/correction record for a clip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    /// Global 1-based clip number
    #[serde(rename = "audioN")]
    pub audio_n: i64,

    /// 1 = original failure, increasing with each regeneration try
    pub attempt: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(rename = "audioID", default, skip_serializing_if = "Option::is_none")]
    pub audio_id: Option<i64>,

    /// Upstream error message, when the feed carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CorrectionRecord {
    pub fn new(audio_n: i64, attempt: u32) -> Self {
        Self {
            audio_n,
            attempt,
            text: None,
            audio_id: None,
            error: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Records of clips that failed in one retry round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBlock {
    #[serde(rename = "toRetry", default)]
    pub to_retry: Vec<CorrectionRecord>,
}

impl ErrorBlock {
    pub fn new(to_retry: Vec<CorrectionRecord>) -> Self {
        Self { to_retry }
    }
}

/// Validated history for one artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionHistory {
    #[serde(default)]
    pub errors: Vec<ErrorBlock>,

    #[serde(default)]
    pub manual: Vec<CorrectionRecord>,
}

impl CorrectionHistory {
    /// Parse and validate the raw feed
    ///
    /// `errors` must be an array of error blocks and `manual` an array of
    /// records; `null` is accepted for either and means "none".
    pub fn from_json(errors: &Value, manual: &Value) -> Result<Self> {
        let errors: Vec<ErrorBlock> = if errors.is_null() {
            Vec::new()
        } else {
            serde_json::from_value(errors.clone())
                .map_err(|e| Error::InvalidInput(format!("malformed error blocks: {}", e)))?
        };
        let manual: Vec<CorrectionRecord> = if manual.is_null() {
            Vec::new()
        } else {
            serde_json::from_value(manual.clone())
                .map_err(|e| Error::InvalidInput(format!("malformed manual corrections: {}", e)))?
        };

        let history = Self { errors, manual };
        history.validate()?;
        Ok(history)
    }

    /// Reject records with a non-positive clip number or attempt
    pub fn validate(&self) -> Result<()> {
        for (block_index, block) in self.errors.iter().enumerate() {
            for (position, record) in block.to_retry.iter().enumerate() {
                check_record(record).map_err(|reason| {
                    Error::InvalidInput(format!(
                        "error block {} record {}: {}",
                        block_index, position, reason
                    ))
                })?;
            }
        }
        for (position, record) in self.manual.iter().enumerate() {
            check_record(record).map_err(|reason| {
                Error::InvalidInput(format!("manual correction {}: {}", position, reason))
            })?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.iter().all(|b| b.to_retry.is_empty()) && self.manual.is_empty()
    }
}

fn check_record(record: &CorrectionRecord) -> std::result::Result<(), String> {
    if record.audio_n < 1 {
        return Err(format!("audioN must be >= 1 (got {})", record.audio_n));
    }
    if record.attempt < 1 {
        return Err("attempt must be >= 1 (got 0)".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_known_fields() {
        let errors = json!([
            {"toRetry": [{"audioN": 4, "attempt": 1, "text": "hello", "voice": "x"}]}
        ]);
        let manual = json!([{"audioN": 2, "attempt": 3, "audioID": 99}]);

        let history = CorrectionHistory::from_json(&errors, &manual).unwrap();
        assert_eq!(history.errors[0].to_retry[0].text.as_deref(), Some("hello"));
        assert_eq!(history.manual[0].audio_id, Some(99));
    }

    #[test]
    fn test_null_means_empty() {
        let history = CorrectionHistory::from_json(&Value::Null, &Value::Null).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_rejects_non_positive_clip_number() {
        let errors = json!([{"toRetry": [{"audioN": 1, "attempt": 1}, {"audioN": 0, "attempt": 1}]}]);
        let err = CorrectionHistory::from_json(&errors, &Value::Null).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("error block 0 record 1"), "{}", message);
    }

    #[test]
    fn test_rejects_zero_attempt() {
        let manual = json!([{"audioN": 3, "attempt": 0}]);
        assert!(CorrectionHistory::from_json(&Value::Null, &manual).is_err());
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let errors = json!({"toRetry": []});
        assert!(matches!(
            CorrectionHistory::from_json(&errors, &Value::Null),
            Err(Error::InvalidInput(_))
        ));
    }
}
