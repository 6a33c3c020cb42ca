//! Core types for the table of contents and chapter store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content::ChapterContent;
use crate::json;

/// Title used when neither the TOC nor the book row carries one.
pub const UNTITLED: &str = "Untitled";

/// Denormalized, phase-grouped table of contents stored on a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocDocument {
    pub ebook_title: String,
    #[serde(default)]
    pub total_chapters: usize,
    #[serde(default)]
    pub phases: Vec<Phase>,
    /// Top-level keys this crate does not interpret, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named group of chapters.
///
/// Everything except `chapters` belongs to the administrator and survives
/// reconciliation untouched. A metadata key holding a non-string value is
/// kept in `extra` so it round-trips unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_earned: Option<String>,
    #[serde(default)]
    pub chapters: Vec<TocChapterEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One chapter line inside a phase.
///
/// `jsonFile`, `type` and `week` are owned by the administrator and kept
/// exactly as stored, whatever their JSON kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocChapterEntry {
    pub chapter_number: i32,
    #[serde(default)]
    pub chapter_title: String,
    #[serde(default)]
    pub json_file: Option<Value>,
    #[serde(default, rename = "type")]
    pub kind: Option<Value>,
    #[serde(default)]
    pub week: Option<Value>,
}

/// Where a loaded TOC came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TocSource {
    /// Parsed from the stored document.
    Stored,
    /// The stored document was absent or unusable; a single phase was synthesized.
    Synthesized,
}

/// A chapter row as seen by the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterSnapshot {
    pub id: i64,
    pub chapter_number: i32,
    pub content: ChapterContent,
}

impl Phase {
    /// The single phase used when a book has no usable TOC.
    pub fn fallback() -> Self {
        Self {
            phase_id: Some("phase_1".to_string()),
            phase_title: Some("PHASE 1".to_string()),
            phase_description: Some(String::new()),
            badge_earned: Some(String::new()),
            chapters: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Build a phase from a stored JSON object.
    ///
    /// Chapter entries that are not objects or lack a positive
    /// `chapterNumber` are dropped.
    pub fn from_object(mut obj: Map<String, Value>) -> Self {
        let chapters = match obj.remove("chapters") {
            Some(Value::Array(items)) => items.iter().filter_map(TocChapterEntry::from_value).collect(),
            _ => Vec::new(),
        };

        Self {
            phase_id: take_string(&mut obj, "phaseId"),
            phase_title: take_string(&mut obj, "phaseTitle"),
            phase_description: take_string(&mut obj, "phaseDescription"),
            badge_earned: take_string(&mut obj, "badgeEarned"),
            chapters,
            extra: obj,
        }
    }
}

impl TocChapterEntry {
    /// Read a stored entry leniently. Returns `None` for entries without a
    /// usable chapter number.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let chapter_number = obj.get("chapterNumber").and_then(json::positive_number)?;

        Some(Self {
            chapter_number,
            chapter_title: obj.get("chapterTitle").and_then(json::text).unwrap_or_default(),
            json_file: stored(obj, "jsonFile"),
            kind: stored(obj, "type"),
            week: stored(obj, "week"),
        })
    }

    /// The `jsonFile` value as a file name, if it reads as one.
    pub fn json_file_name(&self) -> Option<String> {
        self.json_file.as_ref().and_then(json::text)
    }
}

fn stored(obj: &Map<String, Value>, key: &str) -> Option<Value> {
    obj.get(key).filter(|v| !v.is_null()).cloned()
}

impl TocDocument {
    /// A document with one empty fallback phase.
    pub fn fallback(ebook_title: &str) -> Self {
        Self {
            ebook_title: ebook_title.to_string(),
            total_chapters: 0,
            phases: vec![Phase::fallback()],
            extra: Map::new(),
        }
    }

    /// Load a stored TOC, falling back to a single synthesized phase when the
    /// text is absent, not a JSON object, or has no usable `phases` array.
    ///
    /// `book_title` is used when the document has no `ebookTitle`.
    pub fn load(raw: Option<&str>, book_title: Option<&str>) -> (Self, TocSource) {
        let value = raw
            .filter(|raw| !raw.trim().is_empty())
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok());
        Self::from_value(value.unwrap_or(Value::Null), book_title)
    }

    /// Same as [`TocDocument::load`] for an already decoded value.
    pub fn from_value(value: Value, book_title: Option<&str>) -> (Self, TocSource) {
        let fallback_title = book_title.unwrap_or(UNTITLED);

        let mut obj = match value {
            Value::Object(obj) => obj,
            _ => return (Self::fallback(fallback_title), TocSource::Synthesized),
        };

        let ebook_title = match obj.remove("ebookTitle") {
            Some(Value::String(title)) => title,
            _ => fallback_title.to_string(),
        };
        let total_chapters = obj
            .remove("totalChapters")
            .as_ref()
            .and_then(json::lenient_int)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);

        let phases: Vec<Phase> = match obj.remove("phases") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(phase) => Some(Phase::from_object(phase)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        if phases.is_empty() {
            let doc = Self {
                ebook_title,
                total_chapters,
                phases: vec![Phase::fallback()],
                extra: obj,
            };
            return (doc, TocSource::Synthesized);
        }

        let doc = Self {
            ebook_title,
            total_chapters,
            phases,
            extra: obj,
        };
        (doc, TocSource::Stored)
    }

    /// Serialize for storage.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Every chapter number listed across all phases, in document order.
    #[cfg(test)]
    pub fn chapter_numbers(&self) -> Vec<i32> {
        self.phases
            .iter()
            .flat_map(|phase| phase.chapters.iter().map(|c| c.chapter_number))
            .collect()
    }

    /// Find the entry for a chapter number.
    #[cfg(test)]
    pub fn entry(&self, number: i32) -> Option<&TocChapterEntry> {
        self.phases
            .iter()
            .flat_map(|phase| phase.chapters.iter())
            .find(|c| c.chapter_number == number)
    }
}

fn take_string(obj: &mut Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(_)) => match obj.remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}
