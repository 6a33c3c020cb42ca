//! Core table-of-contents library shared by the backend.
//!
//! Provides:
//! - Typed TOC documents with lenient loading from stored JSON
//! - TOC reconciliation against the chapter store
//! - Reorder payload parsing and collision-free renumber planning
//! - Chapter number allocation
//! - Chapter content numbering and import helpers

pub mod allocator;
pub mod content;
pub mod error;
pub mod import;
mod json;
pub mod reorder;
pub mod toc;
pub mod types;

pub use allocator::{allocate_chapter_number, Allocation, MAX_CHAPTER_NUMBER};
pub use content::ChapterContent;
pub use error::{AllocationError, ImportError, ReorderError};
pub use import::{plan_bundle, prepare_chapters, BundlePlan, ChapterImport};
pub use reorder::{
    parse_reorder_payload, plan_reorder, renumber_offset, ChapterAssignment, ReorderItem,
    ReorderPlan, DEFAULT_RENUMBER_OFFSET,
};
pub use toc::reconcile;
pub use types::{ChapterSnapshot, Phase, TocChapterEntry, TocDocument, TocSource, UNTITLED};
