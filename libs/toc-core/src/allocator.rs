//! Chapter number allocation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::AllocationError;

/// Largest chapter number handed out or accepted in a reorder.
///
/// Twice this value still fits in `i32`, so the reorder bump phase can add
/// an offset above every stored number without overflowing the column.
pub const MAX_CHAPTER_NUMBER: i32 = 1_000_000_000;

/// A free chapter number plus one warning per occupied number skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub number: i32,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Find the smallest free number at or above `desired`.
///
/// A missing or non-positive `desired` starts the search at 1. Numbers are
/// tried one at a time, so every collision produces its own warning. The
/// search never goes past [`MAX_CHAPTER_NUMBER`].
pub fn allocate_chapter_number(
    desired: Option<i32>,
    occupied: &BTreeSet<i32>,
) -> Result<Allocation, AllocationError> {
    let start = desired.filter(|n| *n > 0).unwrap_or(1);
    if start > MAX_CHAPTER_NUMBER {
        return Err(AllocationError::TooLarge {
            desired: start,
            max: MAX_CHAPTER_NUMBER,
        });
    }

    let mut number = start;
    let mut warnings = Vec::new();

    while occupied.contains(&number) {
        let next = number
            .checked_add(1)
            .filter(|n| *n <= MAX_CHAPTER_NUMBER)
            .ok_or(AllocationError::Exhausted {
                from: start,
                max: MAX_CHAPTER_NUMBER,
            })?;
        warnings.push(collision_warning(number, next));
        number = next;
    }

    Ok(Allocation { number, warnings })
}

fn collision_warning(taken: i32, assigned: i32) -> String {
    format!(
        "chapter_number {} đã tồn tại, chương được gán thành {}",
        taken, assigned
    )
}
