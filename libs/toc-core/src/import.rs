//! Preparing imported chapter documents and book bundles.
//!
//! Imported chapter JSON may announce its own number (`chapter_number`,
//! `chapterNumber` or `number`) and title (`chapterTitle` or `title`). The
//! announced number is only a wish; the allocator decides the final one.

use serde_json::{Map, Value};

use crate::content::ChapterContent;
use crate::error::ImportError;
use crate::json;
use crate::types::{TocDocument, UNTITLED};

const NUMBER_KEYS: [&str; 3] = ["chapter_number", "chapterNumber", "number"];

/// A chapter ready to be allocated and inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterImport {
    pub desired_number: Option<i32>,
    pub title: String,
    pub content: ChapterContent,
}

/// Chapters extracted from a book bundle plus problems found on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundlePlan {
    pub title: String,
    pub chapters: Vec<ChapterImport>,
    pub warnings: Vec<String>,
}

/// First numeric value among the announced number keys.
pub fn announced_number(doc: &Map<String, Value>) -> Option<i32> {
    NUMBER_KEYS
        .iter()
        .find_map(|key| doc.get(*key).and_then(json::lenient_int))
        .and_then(|n| i32::try_from(n).ok())
}

/// Non-empty `chapterTitle`, else non-empty `title`, else empty.
pub fn announced_title(doc: &Map<String, Value>) -> String {
    ["chapterTitle", "title"]
        .iter()
        .filter_map(|key| doc.get(*key).and_then(json::text))
        .find(|title| !title.is_empty())
        .unwrap_or_default()
}

/// Prepare a batch of chapter documents. Every document must be an object.
pub fn prepare_chapters(docs: Vec<Value>) -> Result<Vec<ChapterImport>, ImportError> {
    if docs.is_empty() {
        return Err(ImportError::NoChapters);
    }

    docs.into_iter()
        .enumerate()
        .map(|(index, doc)| match doc {
            Value::Object(map) => Ok(ChapterImport {
                desired_number: announced_number(&map),
                title: announced_title(&map),
                content: ChapterContent::from(map),
            }),
            _ => Err(ImportError::NotAnObject { index }),
        })
        .collect()
}

/// Walk a bundle's TOC and pair each entry with its chapter file.
///
/// The entry's `chapterNumber` is the desired number and its `chapterTitle`
/// the title (falling back to the file's own title). Entries whose
/// `jsonFile` is missing from `files`, or whose file is not an object, are
/// skipped with a warning.
pub fn plan_bundle(
    toc: &Value,
    files: &Map<String, Value>,
    title: Option<&str>,
) -> Result<BundlePlan, ImportError> {
    if !toc.is_object() {
        return Err(ImportError::InvalidToc);
    }
    let (document, _) = TocDocument::from_value(toc.clone(), None);

    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| {
            toc.get("ebookTitle")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| UNTITLED.to_string());

    let mut plan = BundlePlan {
        title,
        ..BundlePlan::default()
    };

    for entry in document.phases.iter().flat_map(|phase| phase.chapters.iter()) {
        let Some(file) = entry.json_file_name() else {
            plan.warnings.push(format!(
                "chapter {} has no jsonFile, skipped",
                entry.chapter_number
            ));
            continue;
        };
        match files.get(&file) {
            Some(Value::Object(map)) => {
                let title = if entry.chapter_title.is_empty() {
                    announced_title(map)
                } else {
                    entry.chapter_title.clone()
                };
                plan.chapters.push(ChapterImport {
                    desired_number: Some(entry.chapter_number),
                    title,
                    content: ChapterContent::from(map.clone()),
                });
            }
            Some(_) => plan
                .warnings
                .push(format!("chapter file {} is not a JSON object, skipped", file)),
            None => plan
                .warnings
                .push(format!("chapter file not found: {}", file)),
        }
    }

    Ok(plan)
}
