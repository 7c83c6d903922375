//! Global clip number → section-local script text
//!
//! Clips are numbered 1-based and continuously across all sections in
//! section order. A section with `k` texts covers `[start, start + k - 1]`;
//! sections without texts take up no numbers.

use serde::Serialize;

use super::Section;

/// Where a global clip number lands inside the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClipLocation<'a> {
    #[serde(rename = "sectionId")]
    pub section_id: i64,
    /// 0-based position inside the section
    #[serde(rename = "localIndex")]
    pub local_index: usize,
    pub text: &'a str,
}

/// Locate the clip at 1-based position `audio_n`
///
/// Returns `None` for `audio_n < 1`, past the last clip, or when there are
/// no sections.
pub fn locate_clip(sections: &[Section], audio_n: i64) -> Option<ClipLocation<'_>> {
    if audio_n < 1 {
        return None;
    }

    let mut start: i64 = 1;
    for section in sections {
        let count = section.texts.len() as i64;
        if count == 0 {
            continue;
        }
        if audio_n < start + count {
            let local_index = (audio_n - start) as usize;
            return Some(ClipLocation {
                section_id: section.section_id,
                local_index,
                text: &section.texts[local_index],
            });
        }
        start += count;
    }

    None
}

/// Text of the clip at 1-based position `audio_n`
pub fn resolve_clip_text(sections: &[Section], audio_n: i64) -> Option<&str> {
    locate_clip(sections, audio_n).map(|loc| loc.text)
}

/// Number of clips across all sections
pub fn total_clips(sections: &[Section]) -> usize {
    sections.iter().map(|s| s.texts.len()).sum()
}
