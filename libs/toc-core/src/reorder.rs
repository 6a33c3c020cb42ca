//! Chapter reorder planning.
//!
//! A reorder payload lists chapter ids in their intended final order, either
//! as `{ "items": [...] }` or as a bare array. Each item is an object
//! `{ "id": .., "chapter_number": .. }` (number optional) or a bare id.
//! Without an explicit number an item takes its 1-based position.
//!
//! Applying the plan against the database is a two-phase renumber: every
//! row of the book is first bumped by [`renumber_offset`], then each row is
//! written with its final number. No intermediate state can collide with a
//! row that has not been written yet.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::allocator::MAX_CHAPTER_NUMBER;
use crate::error::ReorderError;
use crate::json;

/// Smallest offset used for the bump phase.
pub const DEFAULT_RENUMBER_OFFSET: i32 = 10_000;

/// One recognized item of a reorder payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderItem {
    pub id: i64,
    /// Explicit target number; `None` means "use the item's position".
    pub chapter_number: Option<i32>,
}

/// Final number for one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterAssignment {
    pub id: i64,
    pub chapter_number: i32,
}

/// The mapping a reorder will apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderPlan {
    /// Payload order first, then chapters the payload did not mention.
    pub assignments: Vec<ChapterAssignment>,
    /// Payload ids that do not belong to the book; they are not applied.
    pub unknown_ids: Vec<i64>,
}

impl ReorderPlan {
    pub fn number_for(&self, id: i64) -> Option<i32> {
        self.assignments
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.chapter_number)
    }

    pub fn max_number(&self) -> i32 {
        self.assignments
            .iter()
            .map(|a| a.chapter_number)
            .max()
            .unwrap_or(0)
    }
}

/// Parse a reorder payload.
///
/// Items that are neither an object with an `id` nor a numeric id are
/// skipped and do not take a position.
pub fn parse_reorder_payload(payload: &Value) -> Result<Vec<ReorderItem>, ReorderError> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("items") {
            Some(Value::Array(items)) => items,
            _ => return Err(ReorderError::NotAList),
        },
        _ => return Err(ReorderError::NotAList),
    };

    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Object(obj) => {
                let Some(id) = obj.get("id").and_then(json::lenient_int) else {
                    continue;
                };
                let chapter_number = match obj.get("chapter_number") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) if s.trim().is_empty() => None,
                    Some(raw) => Some(
                        json::positive_number(raw)
                            .filter(|n| *n <= MAX_CHAPTER_NUMBER)
                            .ok_or_else(|| ReorderError::InvalidChapterNumber {
                                id,
                                value: raw.to_string(),
                            })?,
                    ),
                };
                parsed.push(ReorderItem { id, chapter_number });
            }
            other => {
                if let Some(id) = json::lenient_int(other) {
                    parsed.push(ReorderItem {
                        id,
                        chapter_number: None,
                    });
                }
            }
        }
    }

    if parsed.is_empty() {
        return Err(ReorderError::Empty);
    }
    Ok(parsed)
}

/// Build the final mapping for a book whose chapters are `existing_ids`
/// (in current chapter-number order).
///
/// Chapters missing from the payload are appended in their current order,
/// continuing the position counter. A repeated id keeps its first position
/// and its last requested number.
pub fn plan_reorder(items: &[ReorderItem], existing_ids: &[i64]) -> Result<ReorderPlan, ReorderError> {
    let existing: HashSet<i64> = existing_ids.iter().copied().collect();

    let mut order: Vec<i64> = Vec::new();
    let mut numbers: HashMap<i64, i32> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        let number = item.chapter_number.unwrap_or(index as i32 + 1);
        if numbers.insert(item.id, number).is_none() {
            order.push(item.id);
        }
    }

    let mut next = items.len() as i32 + 1;
    for id in existing_ids {
        if !numbers.contains_key(id) {
            numbers.insert(*id, next);
            order.push(*id);
            next += 1;
        }
    }

    let mut plan = ReorderPlan::default();
    let mut claimed: HashMap<i32, i64> = HashMap::new();
    for id in order {
        if !existing.contains(&id) {
            plan.unknown_ids.push(id);
            continue;
        }
        let chapter_number = numbers[&id];
        if let Some(first) = claimed.insert(chapter_number, id) {
            return Err(ReorderError::DuplicateChapterNumber {
                number: chapter_number,
                first,
                second: id,
            });
        }
        plan.assignments.push(ChapterAssignment { id, chapter_number });
    }

    Ok(plan)
}

/// Offset for the bump phase.
///
/// At least `minimum`, and always larger than every current and final
/// number, so bumped values collide with neither. Fails when bumping
/// `current_max` by the offset would leave the `i32` range.
pub fn renumber_offset(minimum: i32, current_max: i32, final_max: i32) -> Result<i32, ReorderError> {
    let overflow = |offset| ReorderError::OffsetOverflow { current_max, offset };

    let offset = current_max
        .max(final_max)
        .checked_add(1)
        .map(|above| minimum.max(above))
        .ok_or_else(|| overflow(i32::MAX))?;
    current_max.checked_add(offset).ok_or_else(|| overflow(offset))?;

    Ok(offset)
}
