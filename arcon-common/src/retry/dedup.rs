//! Collapse historical correction records into per-clip views
//!
//! - [`latest_attempts`]: one record per clip, the one with the highest
//!   attempt across all rounds and manual corrections
//! - [`first_attempts`]: per round, what originally failed before any
//!   correction

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::history::{CorrectionRecord, ErrorBlock};

/// Keep the highest-attempt record per `audio_n`
///
/// Iteration order is every error block's records in order, then the manual
/// corrections. On equal attempts the record seen later wins. The result is a
/// mapping; callers must not rely on any ordering.
pub fn latest_attempts(
    blocks: &[ErrorBlock],
    manual: &[CorrectionRecord],
) -> HashMap<i64, CorrectionRecord> {
    let mut latest: HashMap<i64, CorrectionRecord> = HashMap::new();

    let records = blocks
        .iter()
        .flat_map(|block| block.to_retry.iter())
        .chain(manual.iter());

    for record in records {
        match latest.get(&record.audio_n) {
            Some(kept) if kept.attempt > record.attempt => {}
            _ => {
                latest.insert(record.audio_n, record.clone());
            }
        }
    }

    latest
}

/// Original failures of one retry round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirstAttemptBlock {
    /// Position of the round in the input feed
    #[serde(rename = "blockIndex")]
    pub block_index: usize,
    pub records: Vec<CorrectionRecord>,
}

/// Restrict each block to `attempt == 1` records, deduplicated by clip
///
/// Blocks are filtered independently; within a block the first occurrence
/// of a clip wins. Blocks left empty are dropped.
pub fn first_attempts(blocks: &[ErrorBlock]) -> Vec<FirstAttemptBlock> {
    blocks
        .iter()
        .enumerate()
        .filter_map(|(block_index, block)| {
            let mut seen = HashSet::new();
            let records: Vec<CorrectionRecord> = block
                .to_retry
                .iter()
                .filter(|r| r.attempt == 1 && seen.insert(r.audio_n))
                .cloned()
                .collect();

            if records.is_empty() {
                None
            } else {
                Some(FirstAttemptBlock {
                    block_index,
                    records,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(audio_n: i64, attempt: u32, text: &str) -> CorrectionRecord {
        CorrectionRecord::new(audio_n, attempt).with_text(text)
    }

    #[test]
    fn test_keeps_highest_attempt() {
        let blocks = vec![ErrorBlock::new(vec![rec(1, 1, "a"), rec(1, 2, "b")])];
        let latest = latest_attempts(&blocks, &[]);

        assert_eq!(latest.len(), 1);
        assert_eq!(latest[&1].attempt, 2);
    }

    #[test]
    fn test_highest_attempt_across_blocks_and_manual() {
        let blocks = vec![
            ErrorBlock::new(vec![rec(1, 3, "a3"), rec(2, 1, "b1")]),
            ErrorBlock::new(vec![rec(1, 1, "a1"), rec(2, 2, "b2")]),
        ];
        let manual = vec![rec(2, 5, "b5"), rec(3, 1, "c1")];
        let latest = latest_attempts(&blocks, &manual);

        assert_eq!(latest.len(), 3);
        assert_eq!(latest[&1].text.as_deref(), Some("a3"));
        assert_eq!(latest[&2].attempt, 5);
        assert_eq!(latest[&3].attempt, 1);
    }

    #[test]
    fn test_tie_later_record_wins() {
        let blocks = vec![ErrorBlock::new(vec![rec(4, 2, "first")])];
        let manual = vec![rec(4, 2, "manual")];
        let latest = latest_attempts(&blocks, &manual);

        assert_eq!(latest[&4].text.as_deref(), Some("manual"));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(latest_attempts(&[], &[]).is_empty());
        assert!(first_attempts(&[]).is_empty());
    }

    #[test]
    fn test_first_attempts_per_block() {
        let blocks = vec![
            ErrorBlock::new(vec![rec(1, 1, "x"), rec(1, 1, "dup"), rec(2, 2, "y")]),
            ErrorBlock::new(vec![rec(5, 2, "only retries")]),
            ErrorBlock::new(vec![rec(1, 1, "again"), rec(3, 1, "z")]),
        ];
        let view = first_attempts(&blocks);

        assert_eq!(view.len(), 2);
        assert_eq!(view[0].block_index, 0);
        assert_eq!(view[0].records.len(), 1);
        assert_eq!(view[0].records[0].text.as_deref(), Some("x"));

        // Same clip may reappear in a later round
        assert_eq!(view[1].block_index, 2);
        let clips: Vec<i64> = view[1].records.iter().map(|r| r.audio_n).collect();
        assert_eq!(clips, vec![1, 3]);
    }
}
