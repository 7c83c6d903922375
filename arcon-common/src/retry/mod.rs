//! Retry-request construction and reconciliation engine
//!
//! The operator marks clips or whole sections for regeneration, building a
//! [`RetryData`] tree. The tree is edited only through the pure functions in
//! [`store`], gated by [`validator`] before submission, and translated into
//! the reprocessing backend's wire shape by [`payload`].
//!
//! [`resolver`] and [`dedup`] build read-only views (script text per clip,
//! latest attempt per clip) that help the operator decide what to mark.
//!
//! # Structural sharing
//!
//! Sections and entries are held behind [`Arc`]. An edit clones only the
//! path it touches; untouched sections and entries are shared between the old
//! and the new tree and are never mutated afterwards.

pub mod dedup;
pub mod history;
pub mod payload;
pub mod resolver;
pub mod store;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use dedup::{first_attempts, latest_attempts, FirstAttemptBlock};
pub use history::{CorrectionHistory, CorrectionRecord, ErrorBlock};
pub use payload::{RetryEnvelope, WireEntry, WireRetry, WireSection};
pub use resolver::{locate_clip, resolve_clip_text, total_clips, ClipLocation};
pub use store::EditRejection;
pub use validator::{IssueKind, ValidationIssue};

// ========================================
// Artifact Types
// ========================================

/// One generated section of an artifact's script
///
/// `section_id` is stable but not necessarily contiguous with the section's
/// position in the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "sectionId")]
    pub section_id: i64,

    /// One text per clip produced from this section, in clip order
    #[serde(default)]
    pub texts: Vec<String>,
}

impl Section {
    pub fn new(section_id: i64, texts: Vec<String>) -> Self {
        Self { section_id, texts }
    }
}

// ========================================
// Clip Addressing
// ========================================

/// Resolved lookup key for a retry entry
///
/// A stable `audioID` always wins over the positional index when the caller
/// has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipKey {
    AudioId(i64),
    Index(i64),
}

impl ClipKey {
    /// Does this key address the given entry?
    pub fn matches(&self, entry: &RetryTextEntry) -> bool {
        match *self {
            ClipKey::AudioId(id) => entry.audio_id == Some(id),
            ClipKey::Index(index) => entry.index == index,
        }
    }
}

/// Operator-supplied address of one clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipTarget {
    #[serde(rename = "sectionId")]
    pub section_id: i64,

    /// Clip position as the client expresses it (see [`payload`])
    pub index: i64,

    #[serde(rename = "audioID", default, skip_serializing_if = "Option::is_none")]
    pub audio_id: Option<i64>,
}

impl ClipTarget {
    pub fn new(section_id: i64, index: i64) -> Self {
        Self {
            section_id,
            index,
            audio_id: None,
        }
    }

    pub fn with_audio_id(mut self, audio_id: i64) -> Self {
        self.audio_id = Some(audio_id);
        self
    }

    pub fn key(&self) -> ClipKey {
        match self.audio_id {
            Some(id) => ClipKey::AudioId(id),
            None => ClipKey::Index(self.index),
        }
    }
}

// ========================================
// Retry Tree
// ========================================

/// Per-clip override
///
/// Exactly one of `text_to_use` (replacement text, synthesized verbatim) and
/// `regen` (fresh AI regeneration) is expected to hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryTextEntry {
    #[serde(rename = "audioID", default, skip_serializing_if = "Option::is_none")]
    pub audio_id: Option<i64>,

    pub index: i64,

    #[serde(rename = "textToUse", default)]
    pub text_to_use: Option<String>,

    #[serde(default)]
    pub regen: bool,
}

impl RetryTextEntry {
    /// Entry carrying replacement text
    pub fn with_text(target: &ClipTarget, text: impl Into<String>) -> Self {
        Self {
            audio_id: target.audio_id,
            index: target.index,
            text_to_use: Some(text.into()),
            regen: false,
        }
    }

    /// Entry requesting AI regeneration
    pub fn regenerate(target: &ClipTarget) -> Self {
        Self {
            audio_id: target.audio_id,
            index: target.index,
            text_to_use: None,
            regen: true,
        }
    }
}

/// All requested changes for one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySection {
    #[serde(rename = "sectionId")]
    pub section_id: i64,

    /// Regenerate the whole section; supersedes per-clip overrides
    #[serde(rename = "remakeALL", default)]
    pub remake_all: bool,

    #[serde(default)]
    pub texts: Vec<Arc<RetryTextEntry>>,
}

impl RetrySection {
    pub fn new(section_id: i64) -> Self {
        Self {
            section_id,
            remake_all: false,
            texts: Vec::new(),
        }
    }

    pub fn entry(&self, key: ClipKey) -> Option<&RetryTextEntry> {
        self.texts.iter().find(|e| key.matches(e)).map(Arc::as_ref)
    }
}

/// Root of the retry tree, at most one [`RetrySection`] per `section_id`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryData {
    #[serde(default)]
    pub sections: Vec<Arc<RetrySection>>,
}

impl RetryData {
    pub fn section(&self, section_id: i64) -> Option<&RetrySection> {
        self.sections
            .iter()
            .find(|s| s.section_id == section_id)
            .map(Arc::as_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Number of per-clip overrides across all sections
    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.texts.len()).sum()
    }

    pub(crate) fn position(&self, section_id: i64) -> Option<usize> {
        self.sections.iter().position(|s| s.section_id == section_id)
    }
}
