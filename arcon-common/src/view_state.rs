//! Per-section view state of an edit session
//!
//! Filters and collapse flags the review UI keeps for each section, keyed by
//! section name. Owned by the edit session and dropped with it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// UI state for one section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionViewState {
    #[serde(default)]
    pub collapsed: bool,

    /// Show only clips that appear in the error history
    #[serde(rename = "errorsOnly", default)]
    pub errors_only: bool,

    /// Free-text filter on clip text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Key-value store of [`SectionViewState`] by section name
#[derive(Debug, Clone, Default)]
pub struct ViewStateStore {
    entries: HashMap<String, SectionViewState>,
}

impl ViewStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a section; sections never touched get the default state
    pub fn get(&self, section_name: &str) -> SectionViewState {
        self.entries.get(section_name).cloned().unwrap_or_default()
    }

    /// Store state for a section, returning the previous value
    pub fn set(&mut self, section_name: impl Into<String>, state: SectionViewState) -> Option<SectionViewState> {
        self.entries.insert(section_name.into(), state)
    }
}
