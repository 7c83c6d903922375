//! Invariant-preserving edits of the retry tree
//!
//! Every operation takes the current tree and returns a new one; the caller
//! swaps it in. Rejected edits return an [`EditRejection`] and the caller
//! keeps the old tree, so a rejection behaves as a no-op with a diagnostic.
//!
//! Only the edited section and entry are cloned. Everything else is shared
//! with the previous tree through `Arc`.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::{ClipKey, ClipTarget, RetryData, RetrySection, RetryTextEntry};

/// Edit refused by the store; the tree is left as it was
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditRejection {
    /// Per-clip edits are refused while the whole section is queued for remake
    #[error("section {section_id} is marked for full remake; clip overrides are not accepted")]
    RemakeAllPending { section_id: i64 },

    /// An override must carry text
    #[error("override text for section {section_id} clip {index} is empty")]
    EmptyText { section_id: i64, index: i64 },
}

/// Supply replacement text for one clip
///
/// No-op when `new_text` equals `original_text`, and when the addressed entry
/// is already flagged for regeneration (regen has to be toggled off first).
pub fn set_override_text(
    current: &RetryData,
    target: &ClipTarget,
    new_text: Option<&str>,
    original_text: &str,
) -> Result<RetryData, EditRejection> {
    if new_text == Some(original_text) {
        debug!(section_id = target.section_id, index = target.index, "Override equals original text, ignoring");
        return Ok(current.clone());
    }

    let position = current.position(target.section_id);
    let existing = position.map(|i| &current.sections[i]);

    if existing.is_some_and(|s| s.remake_all) {
        warn!(section_id = target.section_id, "Rejected text override: section is marked for full remake");
        return Err(EditRejection::RemakeAllPending {
            section_id: target.section_id,
        });
    }

    let text = match new_text {
        Some(text) if !text.is_empty() => text,
        _ => {
            warn!(section_id = target.section_id, index = target.index, "Rejected text override: empty text");
            return Err(EditRejection::EmptyText {
                section_id: target.section_id,
                index: target.index,
            });
        }
    };

    let key = target.key();
    let mut section = existing
        .map(|s| RetrySection::clone(s))
        .unwrap_or_else(|| RetrySection::new(target.section_id));

    match find_entry(&section, key) {
        Some(i) => {
            let entry = &section.texts[i];
            if entry.regen {
                debug!(section_id = target.section_id, index = target.index, "Entry is flagged for regeneration, text left untouched");
                return Ok(current.clone());
            }
            if entry.text_to_use.as_deref() == Some(text) {
                return Ok(current.clone());
            }
            let mut entry = RetryTextEntry::clone(entry);
            entry.text_to_use = Some(text.to_string());
            section.texts[i] = Arc::new(entry);
        }
        None => section
            .texts
            .push(Arc::new(RetryTextEntry::with_text(target, text))),
    }

    Ok(put_section(current, position, section))
}

/// Flip the regeneration flag of one clip
///
/// Turning regen on clears any supplied text. Turning it off leaves
/// `text_to_use` as stored (normally empty); the operator has to supply new
/// text before the tree validates again.
pub fn toggle_regenerate(current: &RetryData, target: &ClipTarget) -> Result<RetryData, EditRejection> {
    let position = current.position(target.section_id);
    let existing = position.map(|i| &current.sections[i]);

    if existing.is_some_and(|s| s.remake_all) {
        warn!(section_id = target.section_id, "Rejected regen toggle: section is marked for full remake");
        return Err(EditRejection::RemakeAllPending {
            section_id: target.section_id,
        });
    }

    let mut section = existing
        .map(|s| RetrySection::clone(s))
        .unwrap_or_else(|| RetrySection::new(target.section_id));

    match find_entry(&section, target.key()) {
        Some(i) => {
            let mut entry = RetryTextEntry::clone(&section.texts[i]);
            entry.regen = !entry.regen;
            if entry.regen {
                entry.text_to_use = None;
            }
            section.texts[i] = Arc::new(entry);
        }
        None => section
            .texts
            .push(Arc::new(RetryTextEntry::regenerate(target))),
    }

    Ok(put_section(current, position, section))
}

/// Flip full-section regeneration
///
/// Turning it on discards the section's per-clip overrides; turning it off
/// does not bring them back.
pub fn toggle_section_remake_all(current: &RetryData, section_id: i64) -> RetryData {
    let position = current.position(section_id);

    let section = match position {
        Some(i) => {
            let mut section = RetrySection::clone(&current.sections[i]);
            section.remake_all = !section.remake_all;
            if section.remake_all {
                section.texts.clear();
            }
            section
        }
        None => RetrySection {
            section_id,
            remake_all: true,
            texts: Vec::new(),
        },
    };

    put_section(current, position, section)
}

/// Current override for one clip, if any
pub fn get_entry_state<'a>(current: &'a RetryData, target: &ClipTarget) -> Option<&'a RetryTextEntry> {
    current.section(target.section_id)?.entry(target.key())
}

/// Drop the override for one clip
///
/// A section left with no overrides and no full remake is removed; a tree
/// left with no sections is reset to the empty tree.
pub fn remove_override(current: &RetryData, target: &ClipTarget) -> RetryData {
    let Some(position) = current.position(target.section_id) else {
        return current.clone();
    };
    let section = &current.sections[position];
    let Some(entry_index) = find_entry(section, target.key()) else {
        return current.clone();
    };

    let mut texts = section.texts.clone();
    texts.remove(entry_index);

    let mut sections = current.sections.clone();
    if texts.is_empty() && !section.remake_all {
        sections.remove(position);
    } else {
        sections[position] = Arc::new(RetrySection {
            section_id: section.section_id,
            remake_all: section.remake_all,
            texts,
        });
    }

    if sections.is_empty() {
        return RetryData::default();
    }
    RetryData { sections }
}

fn find_entry(section: &RetrySection, key: ClipKey) -> Option<usize> {
    section.texts.iter().position(|e| key.matches(e))
}

fn put_section(current: &RetryData, position: Option<usize>, section: RetrySection) -> RetryData {
    let mut sections = current.sections.clone();
    match position {
        Some(i) => sections[i] = Arc::new(section),
        None => sections.push(Arc::new(section)),
    }
    RetryData { sections }
}
