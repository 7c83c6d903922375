//! Edit session: one operator reviewing one artifact
//!
//! Holds the artifact's generated sections, its correction history, the
//! retry tree being built and the per-section view state. The tree is
//! replaced wholesale on every accepted edit; a rejected edit leaves it as it
//! was and hands the rejection back for display.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::retry::{
    self, store, validator, ClipLocation, ClipTarget, CorrectionHistory, CorrectionRecord,
    EditRejection, FirstAttemptBlock, RetryData, RetryEnvelope, RetryTextEntry, Section,
    ValidationIssue,
};
use crate::view_state::ViewStateStore;
use crate::Result;

#[derive(Debug, Clone)]
pub struct EditSession {
    id: Uuid,
    task: String,
    opened_at: DateTime<Utc>,
    sections: Vec<Section>,
    history: CorrectionHistory,
    retry: RetryData,
    view_state: ViewStateStore,
}

impl EditSession {
    /// Open a session with an empty retry tree and no history
    pub fn new(task: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task: task.into(),
            opened_at: Utc::now(),
            sections,
            history: CorrectionHistory::default(),
            retry: RetryData::default(),
            view_state: ViewStateStore::new(),
        }
    }

    /// Attach the artifact's correction history, rejecting malformed records
    pub fn with_history(mut self, history: CorrectionHistory) -> Result<Self> {
        history.validate()?;
        self.history = history;
        Ok(self)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn history(&self) -> &CorrectionHistory {
        &self.history
    }

    pub fn retry(&self) -> &RetryData {
        &self.retry
    }

    pub fn view_state(&self) -> &ViewStateStore {
        &self.view_state
    }

    pub fn view_state_mut(&mut self) -> &mut ViewStateStore {
        &mut self.view_state
    }

    /// Generated text at the target's section-local position
    pub fn original_text(&self, target: &ClipTarget) -> Option<&str> {
        let index = usize::try_from(target.index).ok()?;
        self.sections
            .iter()
            .find(|s| s.section_id == target.section_id)?
            .texts
            .get(index)
            .map(String::as_str)
    }

    // ========================================
    // Edits
    // ========================================

    /// Set replacement text; `original_text` defaults to the generated text
    pub fn set_override_text(
        &mut self,
        target: &ClipTarget,
        new_text: Option<&str>,
        original_text: Option<&str>,
    ) -> std::result::Result<&RetryData, EditRejection> {
        let original = original_text.or_else(|| self.original_text(target)).unwrap_or("");
        let next = store::set_override_text(&self.retry, target, new_text, original)?;
        self.retry = next;
        Ok(&self.retry)
    }

    pub fn toggle_regenerate(&mut self, target: &ClipTarget) -> std::result::Result<&RetryData, EditRejection> {
        self.retry = store::toggle_regenerate(&self.retry, target)?;
        Ok(&self.retry)
    }

    pub fn toggle_section_remake_all(&mut self, section_id: i64) -> &RetryData {
        self.retry = store::toggle_section_remake_all(&self.retry, section_id);
        &self.retry
    }

    pub fn remove_override(&mut self, target: &ClipTarget) -> &RetryData {
        self.retry = store::remove_override(&self.retry, target);
        &self.retry
    }

    pub fn entry_state(&self, target: &ClipTarget) -> Option<&RetryTextEntry> {
        store::get_entry_state(&self.retry, target)
    }

    // ========================================
    // Read-only views
    // ========================================

    pub fn locate_clip(&self, audio_n: i64) -> Option<ClipLocation<'_>> {
        retry::locate_clip(&self.sections, audio_n)
    }

    pub fn latest_corrections(&self) -> HashMap<i64, CorrectionRecord> {
        retry::latest_attempts(&self.history.errors, &self.history.manual)
    }

    pub fn first_attempts(&self) -> Vec<FirstAttemptBlock> {
        retry::first_attempts(&self.history.errors)
    }

    // ========================================
    // Submission
    // ========================================

    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationIssue>> {
        validator::validate(Some(&self.retry))
    }

    /// Validated, normalized submission body
    pub fn envelope(&self, from_script: bool) -> std::result::Result<RetryEnvelope, Vec<ValidationIssue>> {
        self.validate()?;
        Ok(RetryEnvelope::from_retry_data(
            self.task.clone(),
            Some(&self.retry),
            from_script,
        ))
    }
}
