//! TOC reconciliation.
//!
//! Regenerates the chapter listings of a [`TocDocument`] from the chapter
//! store while keeping everything the store cannot reproduce: phase
//! grouping, phase metadata, and per-chapter `jsonFile`/`type`/`week`.
//!
//! Placement runs in two passes:
//! 1. **Range match** - a chapter goes to the first phase whose previous
//!    `[min, max]` chapter range contains its number.
//! 2. **Count fallback** - leftovers top up each phase, in order, to the
//!    number of chapters it held before; anything still left goes to the
//!    last phase.

use std::collections::HashMap;

use serde_json::Value;

use crate::types::{ChapterSnapshot, Phase, TocChapterEntry, TocDocument};

/// Metadata carried over from the previous TOC by chapter number.
#[derive(Debug, Clone, Default)]
struct PriorMeta {
    json_file: Option<Value>,
    kind: Option<Value>,
    week: Option<Value>,
}

/// Chapter-number span a phase covered before reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PhaseRange {
    min: i32,
    max: i32,
    count: usize,
}

impl PhaseRange {
    /// An empty phase never matches; `max < min`.
    const EMPTY: Self = Self { min: 0, max: -1, count: 0 };

    fn include(&mut self, number: i32) {
        if self.count == 0 {
            self.min = number;
            self.max = number;
        } else {
            self.min = self.min.min(number);
            self.max = self.max.max(number);
        }
        self.count += 1;
    }

    fn contains(&self, number: i32) -> bool {
        self.count > 0 && self.min <= number && number <= self.max
    }
}

/// Rebuild `document` so its chapter listings match `chapters`.
///
/// `chapters` is the full chapter set of the book; order does not matter.
/// Phase metadata and unknown keys are left untouched, `totalChapters` is
/// recomputed. A document without phases receives the fallback phase.
pub fn reconcile(mut document: TocDocument, chapters: &[ChapterSnapshot]) -> TocDocument {
    if document.phases.is_empty() {
        document.phases.push(Phase::fallback());
    }

    let mut prior: HashMap<i32, PriorMeta> = HashMap::new();
    let ranges: Vec<PhaseRange> = document
        .phases
        .iter()
        .map(|phase| {
            let mut range = PhaseRange::EMPTY;
            for entry in &phase.chapters {
                prior.insert(
                    entry.chapter_number,
                    PriorMeta {
                        json_file: entry.json_file.clone(),
                        kind: entry.kind.clone(),
                        week: entry.week.clone(),
                    },
                );
                range.include(entry.chapter_number);
            }
            range
        })
        .collect();

    let mut ordered: Vec<&ChapterSnapshot> = chapters.iter().collect();
    ordered.sort_by_key(|c| c.chapter_number);

    let fresh = ordered.iter().map(|chapter| {
        let number = chapter.chapter_number;
        let meta = prior.get(&number).cloned().unwrap_or_default();
        TocChapterEntry {
            chapter_number: number,
            chapter_title: chapter.content.display_title(number),
            json_file: meta.json_file,
            kind: meta.kind,
            week: meta.week,
        }
    });

    let mut assigned: Vec<Vec<TocChapterEntry>> = vec![Vec::new(); ranges.len()];
    let mut unassigned = Vec::new();
    for entry in fresh {
        match ranges.iter().position(|r| r.contains(entry.chapter_number)) {
            Some(index) => assigned[index].push(entry),
            None => unassigned.push(entry),
        }
    }

    let mut overflow = unassigned.into_iter();
    for (slot, range) in assigned.iter_mut().zip(&ranges) {
        let need = range.count.saturating_sub(slot.len());
        slot.extend(overflow.by_ref().take(need));
    }
    if let Some(last) = assigned.last_mut() {
        last.extend(overflow);
    }

    for (phase, mut entries) in document.phases.iter_mut().zip(assigned) {
        entries.sort_by_key(|e| e.chapter_number);
        phase.chapters = entries;
    }
    document.total_chapters = chapters.len();

    document
}
