//! Error types for toc-core.

use thiserror::Error;

/// Errors raised while parsing or planning a chapter reorder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    #[error("items required")]
    NotAList,

    #[error("items empty")]
    Empty,

    #[error("invalid chapter_number '{value}' for chapter {id}")]
    InvalidChapterNumber { id: i64, value: String },

    #[error("chapter_number {number} requested for both chapter {first} and chapter {second}")]
    DuplicateChapterNumber { number: i32, first: i64, second: i64 },

    #[error("renumber offset {offset} overflows chapter_number {current_max}")]
    OffsetOverflow { current_max: i32, offset: i32 },
}

/// Errors raised while allocating a chapter number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("chapter_number {desired} exceeds the maximum of {max}")]
    TooLarge { desired: i32, max: i32 },

    #[error("no free chapter_number between {from} and {max}")]
    Exhausted { from: i32, max: i32 },
}

/// Errors raised while preparing imported chapter documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("chapters required")]
    NoChapters,

    #[error("chapter document at index {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("toc must be a JSON object")]
    InvalidToc,
}
